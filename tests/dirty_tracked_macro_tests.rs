use dirtyweave::{DirtySet, DirtyTracking};
use dirtyweave_derive::dirty_tracked;

#[dirty_tracked]
mod bank {
    #[derive(Debug, Default)]
    pub struct Account {
        pub id: u64,
        pub version: u32,
        pub balance: f64,
        pub active: bool,
        pub owner: String,
        #[transient]
        pub cache: Vec<String>,
        pub(crate) nickname: String,
        pub(crate) audit: Vec<String>,
    }

    impl Account {
        pub fn get_nickname(&self) -> &String {
            &self.nickname
        }

        pub fn set_nickname(&mut self, nickname: String) {
            self.audit.push(format!("nickname -> {}", nickname));
            self.nickname = nickname;
        }

        pub fn audit(&self) -> &[String] {
            &self.audit
        }
    }

    #[derive(Debug, Default)]
    pub struct Ledger {
        pub entries: Vec<u32>,
        memo: String,
        state: dirtyweave::DirtySet,
    }

    impl Ledger {
        pub fn get_note(&self) -> &str {
            "ledger"
        }

        pub fn get_memo(&self) -> &String {
            &self.memo
        }

        #[raw_access]
        pub fn set_memo(&mut self, memo: String) {
            self.memo = memo;
        }
    }
}

use bank::{Account, Ledger};

#[test]
fn synthesized_setters_record_changes() {
    let mut account = Account::default();
    account.track_changes();
    assert!(!account.has_changed());

    account.set_balance(12.5);
    account.set_owner("alice".to_string());

    assert_eq!(account.get_balance(), 12.5);
    assert_eq!(account.get_owner(), "alice");
    assert!(account.has_property_changed("balance"));
    assert!(account.has_property_changed("owner"));
    assert!(!account.has_property_changed("active"));
    assert_eq!(account.dirty_property_names(), vec!["balance", "owner"]);
}

#[test]
fn boolean_fields_get_both_readers() {
    let mut account = Account::default();
    account.track_changes();

    account.set_active(true);

    assert!(account.get_active());
    assert!(account.is_active());
    assert_eq!(account.dirty_property_names(), vec!["active"]);
}

#[test]
fn existing_writer_is_woven_and_keeps_its_body() {
    let mut account = Account::default();
    account.track_changes();

    account.set_nickname("ace".to_string());

    assert_eq!(account.get_nickname(), "ace");
    assert_eq!(account.audit(), ["nickname -> ace".to_string()]);
    assert!(account.has_property_changed("nickname"));
}

#[test]
fn fresh_values_count_as_changed_until_tracking_starts() {
    let account = Account::default();
    assert!(account.has_changed());
    assert!(account.has_property_changed("anything"));
    assert_eq!(account.dirty_state(), &DirtySet::new());
}

#[test]
fn existing_state_field_backs_the_capability() {
    let mut ledger = Ledger::default();
    ledger.track_changes();

    ledger.set_entries(vec![1, 2]);
    assert_eq!(ledger.get_entries(), &vec![1, 2]);
    assert_eq!(ledger.dirty_property_names(), vec!["entries"]);

    ledger.track_changes();
    ledger.set_memo("restored".to_string());
    assert_eq!(ledger.get_memo(), "restored");
    assert!(!ledger.has_changed());
    assert_eq!(ledger.get_note(), "ledger");
}

#[test]
fn struct_update_syntax_fills_the_hidden_state() {
    let mut account = Account {
        balance: 3.0,
        owner: "bob".to_string(),
        ..Default::default()
    };
    account.track_changes();

    account.set_balance(4.0);

    assert_eq!(account.get_owner(), "bob");
    assert_eq!(account.dirty_property_names(), vec!["balance"]);
}
