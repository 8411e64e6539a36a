use serde::{Deserialize, Serialize};

/// Latest observed state of a single board (one webDiplomacy game the
/// logged-in user is a member of).
///
/// `id` is the stable game id from the home page and the only key used to
/// match an observation against stored state. `name` and `my_country` are
/// informational; change detection looks at `date`, `phase` and the mail
/// flag only. `order_status` is persisted but never drives an alert on its
/// own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub id: i64,
    pub name: String,
    pub my_country: String,
    pub date: String,
    pub phase: String,
    pub order_status: String,
    pub has_mail: bool,
}

/// Singleton login and outbound-mail settings, collected interactively on
/// first run and stored next to the boards. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login_user: String,
    pub login_pass: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_from: String,
    pub smtp_to: String,
    pub smtp_user: String,
    pub smtp_password: String,
}
