use minimap_core::settings::DEFAULT_HEADER_COLORS;
use minimap_core::{
    Color, JsonSettingsStore, MemoryHost, MinimapController, Settings, SettingsStore,
};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonSettingsStore::new(dir.path().join("settings.json"));
    assert_eq!(store.load(), Settings::default());
}

#[test]
fn test_save_creates_parent_directories_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("minimap").join("settings.json");
    let mut store = JsonSettingsStore::new(&path);

    let mut settings = Settings::default();
    settings.width = 180.0;
    settings.header_colors[2] = Color::rgb(0x12, 0x34, 0x56);
    settings.set_file_enabled("notes/a.md", false);
    store.save(&settings).unwrap();

    assert!(path.exists());
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["width"], serde_json::json!(180.0));
    assert_eq!(raw["headerColors"][2], serde_json::json!("#123456"));
    assert_eq!(raw["disabledFiles"], serde_json::json!(["notes/a.md"]));

    assert_eq!(store.load(), settings);
}

#[test]
fn test_unparseable_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();
    assert_eq!(JsonSettingsStore::new(&path).load(), Settings::default());
}

#[test]
fn test_malformed_fields_fall_back_individually() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r##"{
            "width": "wide",
            "lineHeight": 4,
            "textColor": "#ABCDEF",
            "indicatorColor": "blue",
            "headerColors": ["#000001", 7, "#000003"],
            "disabledFiles": 7,
            "minimapOpacity": 12,
            "someFutureKey": true
        }"##,
    )
    .unwrap();

    let settings = JsonSettingsStore::new(&path).load();
    let defaults = Settings::default();
    assert_eq!(settings.width, defaults.width);
    assert_eq!(settings.line_height, 4.0);
    assert_eq!(settings.text_color, Color::rgb(0xAB, 0xCD, 0xEF));
    assert_eq!(settings.indicator_color, defaults.indicator_color);
    assert_eq!(settings.header_colors[0], Color::rgb(0, 0, 1));
    assert_eq!(settings.header_colors[1], DEFAULT_HEADER_COLORS[1]);
    assert_eq!(settings.header_colors[2], Color::rgb(0, 0, 3));
    assert_eq!(settings.header_colors[3], DEFAULT_HEADER_COLORS[3]);
    assert!(settings.disabled_files.is_empty());
    assert_eq!(settings.minimap_opacity, 1.0);
}

#[test]
fn test_controller_persists_through_the_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut host = MemoryHost::new();
    let view = host.open("notes/a.md", "text", 300.0);
    let mut controller = MinimapController::new(JsonSettingsStore::new(&path));
    controller.on_view_opened(&mut host, view);
    controller.toggle_active_document(&mut host);

    let reloaded = JsonSettingsStore::new(&path).load();
    assert!(!reloaded.is_minimap_enabled_for_file("notes/a.md"));

    let restarted = MinimapController::new(JsonSettingsStore::new(&path));
    assert!(!restarted.is_minimap_enabled_for_file("notes/a.md"));
    assert_eq!(restarted.store().path(), path.as_path());
}

#[test]
fn test_save_replaces_the_file_without_leaving_a_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut store = JsonSettingsStore::new(&path);

    let mut settings = Settings::default();
    store.save(&settings).unwrap();
    settings.width = 140.0;
    store.save(&settings).unwrap();

    assert_eq!(store.load(), settings);
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("settings.json")]);
}

#[test]
fn test_failed_save_keeps_the_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut store = JsonSettingsStore::new(&path);
    let mut settings = Settings::default();
    settings.width = 160.0;
    store.save(&settings).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    // A directory where the temporary file would go makes the write fail.
    fs::create_dir(dir.path().join("settings.json.tmp")).unwrap();
    settings.width = 200.0;
    assert!(store.save(&settings).is_err());

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert_eq!(store.load().width, 160.0);
}
