const COMMANDS: &[&str] = &[
    "get_active_notifications",
    "open_access_settings",
    "is_access_enabled",
    "get_notifications",
    "delete_all_notifications",
    "get_total_count",
    "get_database_size",
    "import_notifications",
    "get_config",
    "set_config",
];

fn main() {
    tauri_plugin::Builder::new(COMMANDS).build();
}
