//! Profile display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Profile, StoreId};

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Stores")]
    stores: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

pub fn format_profile_list(profiles: &[Profile], store_names: &HashMap<StoreId, String>) -> String {
    if profiles.is_empty() {
        return "No users found.".to_string();
    }

    let rows = profiles.iter().map(|p| ProfileRow {
        id: p.id.to_string(),
        username: p.username.clone(),
        email: p.email.clone().unwrap_or_default(),
        role: p.role.to_string(),
        stores: if p.role.is_admin() {
            "all".to_string()
        } else {
            p.allowed_stores
                .iter()
                .map(|id| store_names.get(id).cloned().unwrap_or_else(|| id.to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        },
        status: if p.blocked {
            "Blocked"
        } else if p.is_confirmed() {
            "Active"
        } else {
            "Unconfirmed"
        },
    });
    Table::new(rows).with(Style::psql()).to_string()
}
