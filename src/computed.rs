//! Fields derived from a bill's actions, refreshed on every save.

use crate::constants::ACTION_PASSAGE;
use crate::domain::{Bill, BillAction};

pub fn update_bill_fields(bill: &mut Bill, actions: &[BillAction]) {
    let mut ordered: Vec<&BillAction> = actions.iter().collect();
    ordered.sort_by_key(|a| a.order);

    bill.first_action_date = ordered
        .first()
        .map(|a| a.date.clone())
        .unwrap_or_default();

    match ordered.last() {
        Some(latest) => {
            bill.latest_action_date = latest.date.clone();
            bill.latest_action_description = latest.description.clone();
        }
        None => {
            bill.latest_action_date = String::new();
            bill.latest_action_description = String::new();
        }
    }

    bill.latest_passage_date = ordered
        .iter()
        .filter(|a| a.has_classification(ACTION_PASSAGE))
        .map(|a| a.date.clone())
        .max()
        .unwrap_or_default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn action(order: i64, date: &str, description: &str, classification: &[&str]) -> BillAction {
        BillAction {
            organization_id: "ocd-organization/house".into(),
            description: description.into(),
            date: date.into(),
            classification: classification.iter().map(|c| c.to_string()).collect(),
            order,
            ..Default::default()
        }
    }

    fn bill() -> Bill {
        Bill {
            id: "ocd-bill/1".into(),
            legislative_session_id: 1,
            identifier: "HB 1".into(),
            title: "Title".into(),
            from_organization_id: "ocd-organization/house".into(),
            classification: vec!["bill".into()],
            subject: vec![],
            first_action_date: String::new(),
            latest_action_date: String::new(),
            latest_action_description: String::new(),
            latest_passage_date: String::new(),
            extras: serde_json::Value::Null,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn uses_action_order_not_list_order() {
        let mut b = bill();
        let actions = vec![
            action(30, "2018-03-01", "Passed House", &["passage"]),
            action(10, "2018-01-01", "Introduced", &["introduction"]),
            action(20, "2018-02-01", "Amended", &[]),
        ];
        update_bill_fields(&mut b, &actions);
        assert_eq!(b.first_action_date, "2018-01-01");
        assert_eq!(b.latest_action_date, "2018-03-01");
        assert_eq!(b.latest_action_description, "Passed House");
        assert_eq!(b.latest_passage_date, "2018-03-01");
    }

    #[test]
    fn clears_fields_without_actions() {
        let mut b = bill();
        b.latest_action_date = "2020-01-01".into();
        update_bill_fields(&mut b, &[]);
        assert!(b.first_action_date.is_empty());
        assert!(b.latest_action_date.is_empty());
        assert!(b.latest_passage_date.is_empty());
    }
}
