//! Shared scenario for service tests.
//!
//! ```text
//! A (level 1, no manager)
//! └── B (level 2, managed by Max)
//!     ├── C (level 3, managed by Mia)   Engineer: Eli, Eva   Lead: Mia
//!     └── D (level 3, no manager)       Analyst: Max, Ian
//! ```

use std::time::Duration;

use chrono::NaiveDate;

use crate::{
    auth::auth::AuthUser,
    model::{organization::NewOrganization, position::NewPosition},
    service::{
        catalog::{create_pay_item, create_position},
        hierarchy::ManagerIndex,
        ledger::LedgerSettings,
        org_tree::{create_organization, set_manager},
        standard::{StandardItemInput, review, submit},
    },
    store::memory::MemoryStore,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Fixture {
    pub store: MemoryStore,
    pub index: ManagerIndex,
    pub settings: LedgerSettings,

    pub org_a: u64,
    pub org_b: u64,
    pub org_c: u64,
    pub org_d: u64,

    pub engineer: u64,
    pub lead: u64,
    pub analyst: u64,

    pub m1: u64,
    pub e1: u64,
    pub e2: u64,
    pub m2: u64,
    pub e3: u64,

    pub base: u64,
    pub allowance: u64,
    pub bonus: u64,
    pub deduction: u64,
}

impl Fixture {
    pub async fn build() -> Self {
        Self::build_with_items(&["Base Pay", "Allowance", "Bonus", "Deduction"]).await
    }

    /// Same tree, but only the named pay items exist. Missing well-known
    /// items come back as id 0.
    pub async fn build_with_items(items: &[&str]) -> Self {
        let store = MemoryStore::new();
        let index = ManagerIndex::new(Duration::from_secs(60));
        let admin = AuthUser::admin();

        let org = |name: &str, level: u8, parent_id: Option<u64>| NewOrganization {
            name: name.to_string(),
            level,
            parent_id,
        };
        let org_a = create_organization(&store, &admin, org("A", 1, None)).await.unwrap().id;
        let org_b = create_organization(&store, &admin, org("B", 2, Some(org_a))).await.unwrap().id;
        let org_c = create_organization(&store, &admin, org("C", 3, Some(org_b))).await.unwrap().id;
        let org_d = create_organization(&store, &admin, org("D", 3, Some(org_b))).await.unwrap().id;

        let position = |name: &str, organization_id: u64| NewPosition {
            name: name.to_string(),
            organization_id,
            description: None,
        };
        let engineer = create_position(&store, &admin, position("Engineer", org_c)).await.unwrap().id;
        let lead = create_position(&store, &admin, position("Lead", org_c)).await.unwrap().id;
        let analyst = create_position(&store, &admin, position("Analyst", org_d)).await.unwrap().id;

        let m1 = store.add_employee("Mia", Some(lead));
        let e1 = store.add_employee("Eli", Some(engineer));
        let e2 = store.add_employee("Eva", Some(engineer));
        let m2 = store.add_employee("Max", Some(analyst));
        let e3 = store.add_employee("Ian", Some(analyst));

        set_manager(&store, &index, &admin, org_c, Some(m1)).await.unwrap();
        set_manager(&store, &index, &admin, org_b, Some(m2)).await.unwrap();

        let mut ids = [0u64; 4];
        for (slot, name) in ["Base Pay", "Allowance", "Bonus", "Deduction"].iter().enumerate() {
            if items.contains(name) {
                ids[slot] = create_pay_item(&store, &admin, name).await.unwrap().id;
            }
        }
        let [base, allowance, bonus, deduction] = ids;

        let jan = date(2024, 1, 1);
        if base != 0 {
            submit(&store, &admin, engineer, jan, vec![StandardItemInput { pay_item_id: base, amount: 8000.0 }])
                .await
                .unwrap();
            review(&store, &admin, engineer, true).await.unwrap();
        }
        if base != 0 && allowance != 0 {
            submit(
                &store,
                &admin,
                analyst,
                jan,
                vec![
                    StandardItemInput { pay_item_id: base, amount: 6000.0 },
                    StandardItemInput { pay_item_id: allowance, amount: 500.0 },
                ],
            )
            .await
            .unwrap();
            review(&store, &admin, analyst, true).await.unwrap();
        }

        Self {
            store,
            index,
            settings: LedgerSettings {
                bonus_item_name: "Bonus".to_string(),
                deduction_item_name: "Deduction".to_string(),
            },
            org_a,
            org_b,
            org_c,
            org_d,
            engineer,
            lead,
            analyst,
            m1,
            e1,
            e2,
            m2,
            e3,
            base,
            allowance,
            bonus,
            deduction,
        }
    }
}
