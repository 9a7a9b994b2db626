use serde::Deserialize;

use super::*;

#[derive(Debug, Deserialize, PartialEq)]
struct Sample {
    name: String,
    games: Games,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Games {
    idle: u64,
    #[serde(default)]
    strict: bool,
}

const BASE: &str = r#"
name = "base"

[games]
idle = 60
"#;

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

#[test]
fn later_layers_override_earlier_ones() {
    let sample: Sample = Builder::new()
        .add_layer(TomlText::new(BASE))
        .add_layer(TomlText::new("[games]\nstrict = true"))
        .build()
        .expect("valid layers");

    assert_eq!(sample, Sample {
        name: "base".to_owned(),
        games: Games {
            idle: 60,
            strict: true,
        },
    });
}

#[test]
fn env_variables_need_the_prefix() {
    let mut table = deserialize_str_to_table(BASE).expect("valid toml");
    Env::prefixed("ARCADE__").extend_from(
        &mut table,
        vars(&[
            ("ARCADE__GAMES__IDLE", "90"),
            ("ARCADE__NAME", "from env"),
            ("HOME", "/root"),
            ("ARCADE__GAMES__STRICT", "true"),
        ]),
    );

    assert!(!table.contains_key("home"), "unprefixed vars are ignored");

    let sample: Sample = deserialize_table(table).expect("valid table");
    assert_eq!(sample.name, "from env");
    assert_eq!(sample.games.idle, 90, "numbers stay numbers");
    assert!(sample.games.strict, "booleans stay booleans");
}

#[test]
fn malformed_env_keys_are_skipped() {
    let mut table = Table::new();
    Env::prefixed("ARCADE__").extend_from(
        &mut table,
        vars(&[("ARCADE__GAMES____IDLE", "1"), ("ARCADE__", "x")]),
    );

    assert!(table.is_empty(), "nothing inserted: {table:?}");
}

#[test]
fn optional_files_may_be_missing() {
    let sample: Sample = Builder::new()
        .add_layer(TomlText::new(BASE))
        .add_layer(File::new("this/file/does/not/exist.toml").required(false))
        .build()
        .expect("missing optional file is fine");

    assert_eq!(sample.games.idle, 60);
}

#[test]
fn required_files_must_exist() {
    let result = Builder::new()
        .add_layer(TomlText::new(BASE))
        .add_layer(File::new("this/file/does/not/exist.toml"))
        .build::<Sample>();

    let err = result.expect_err("required file is missing");
    assert!(
        format!("{err:#}").contains("cannot read required config"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn env_value_overrides_a_table() {
    let mut table = deserialize_str_to_table(BASE).expect("valid toml");
    insert_at(&mut table, &["games"], Value::String("flat".to_owned()));
    assert_eq!(table.get("games"), Some(&Value::String("flat".to_owned())));
}
