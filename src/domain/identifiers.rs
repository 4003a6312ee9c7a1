use once_cell::sync::Lazy;
use regex::Regex;

static BILL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]*)\s*0*([-\d]+)").expect("valid bill id regex"));
static JOINT_RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(SJR|HJR)\s*([A-Z]+)").expect("valid joint resolution regex"));
static BILL_ID_QUERY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w{1,3}\s?\d{1,5}$").expect("valid bill id query regex"));

/// Normalize a bill identifier into its canonical `"HB 1"` form.
///
/// Uppercases, drops dots, then rewrites the first prefix/number pair: one space
/// between them and no leading zeros. Suffixes such as `-A` are kept, so the URL
/// form from [`strip_bill_id`] maps back to the stored identifier.
pub fn fix_bill_id(raw: &str) -> String {
    let cleaned = raw.replace('.', "").trim().to_uppercase();
    let fixed = if JOINT_RESOLUTION_RE.is_match(&cleaned) {
        JOINT_RESOLUTION_RE.replacen(&cleaned, 1, "$1 $2")
    } else {
        BILL_ID_RE.replacen(&cleaned, 1, "$1 $2")
    };
    fixed.trim().to_string()
}

/// `"HB 1"` -> `"HB1"`, the form used in page URLs.
pub fn strip_bill_id(identifier: &str) -> String {
    identifier.split_whitespace().collect()
}

/// Whether free text typed into a search box should be treated as a bill id.
pub fn looks_like_bill_id(query: &str) -> bool {
    BILL_ID_QUERY_RE.is_match(query.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_spacing_case_and_zeros() {
        assert_eq!(fix_bill_id("HB1"), "HB 1");
        assert_eq!(fix_bill_id("hb 1"), "HB 1");
        assert_eq!(fix_bill_id("H.B. 0042"), "HB 42");
        assert_eq!(fix_bill_id("SB  9"), "SB 9");
        assert_eq!(fix_bill_id("HJR A"), "HJR A");
    }

    #[test]
    fn leaves_unusual_identifiers_alone() {
        assert_eq!(fix_bill_id("LB 1-A"), "LB 1-A");
        assert_eq!(fix_bill_id("Prop A"), "PROP A");
    }

    #[test]
    fn url_form_maps_back_to_identifier() {
        for identifier in ["HB 1", "LB 1-A", "SB 22-B", "HJR A", "SCR 12", "HB 1001"] {
            assert_eq!(fix_bill_id(&strip_bill_id(identifier)), identifier, "{identifier}");
        }
    }

    #[test]
    fn strips_spaces_for_urls() {
        assert_eq!(strip_bill_id("HB 1"), "HB1");
        assert_eq!(strip_bill_id("SCR 12"), "SCR12");
    }

    #[test]
    fn detects_bill_id_queries() {
        assert!(looks_like_bill_id("HB 1"));
        assert!(looks_like_bill_id("hb1"));
        assert!(!looks_like_bill_id("moose"));
        assert!(!looks_like_bill_id("gorgonzola"));
    }
}
