use clap::Parser;
use lesson_catalog::tooling::cli::{AddressArgs, Cli, CliContext, Commands};
use lesson_catalog::CatalogError;
use tempfile::TempDir;

use crate::support::{write_config, MEMORY_CONFIG, SLED_CONFIG};

fn n5_args() -> AddressArgs {
    AddressArgs {
        partition: "N5".to_string(),
        selectors: Vec::new(),
    }
}

fn add_node(cli: &CliContext, parent: Option<u64>, name: &str) {
    cli.execute(&Commands::AddNode {
        address: n5_args(),
        parent,
        name: name.to_string(),
        locked: false,
        hidden: false,
    })
    .unwrap();
}

fn tree_json(cli: &CliContext) -> serde_json::Value {
    let output = cli
        .execute(&Commands::Tree {
            address: n5_args(),
            format: "json".to_string(),
        })
        .unwrap();
    serde_json::from_str(&output).unwrap()
}

fn node_id(tree: &serde_json::Value, name: &str) -> u64 {
    tree["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == name)
        .and_then(|n| n["id"].as_u64())
        .unwrap()
}

#[test]
fn schemas_json_lists_presets_and_configured_catalogs() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    let config = write_config(
        &workspace,
        &format!(
            "{}\n[catalogs.kanji]\nmax_depth = 1\n\n[catalogs.kanji.partition]\nname = \"level\"\nvalues = [\"N5\", \"N4\"]\n",
            MEMORY_CONFIG
        ),
    );
    let cli = CliContext::new(workspace, Some(config)).unwrap();
    let output = cli
        .execute(&Commands::Schemas {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let names: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["catalog"].as_str())
        .collect();
    assert!(names.contains(&"vocabulary"));
    assert!(names.contains(&"kanji"));
}

#[test]
fn tree_json_contract_has_counts() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    let config = write_config(&workspace, MEMORY_CONFIG);
    let cli = CliContext::new(workspace, Some(config)).unwrap();

    add_node(&cli, None, "Bài 1");
    let lesson = node_id(&tree_json(&cli), "Bài 1");
    add_node(&cli, Some(lesson), "Kanji");
    let kanji = node_id(&tree_json(&cli), "Kanji");
    for word in ["日", "月"] {
        cli.execute(&Commands::AddItem {
            address: n5_args(),
            node: Some(kanji),
            payload: format!(r#"{{"word":"{}"}}"#, word),
        })
        .unwrap();
    }

    let tree = tree_json(&cli);
    assert_eq!(tree["catalog"], "vocabulary");
    assert_eq!(tree["total_items"], 2);
    assert_eq!(tree["unfiled_items"], 0);
    let nodes = tree["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["name"], "Bài 1");
    assert_eq!(nodes[0]["depth"], 0);
    assert_eq!(nodes[0]["item_count"], 2);
    assert_eq!(nodes[1]["depth"], 1);
}

#[test]
fn bad_payload_and_bad_selector_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    let config = write_config(&workspace, MEMORY_CONFIG);
    let cli = CliContext::new(workspace, Some(config)).unwrap();

    let err = cli
        .execute(&Commands::AddItem {
            address: n5_args(),
            node: None,
            payload: "{not json".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidSelection(_)));

    let err = cli
        .execute(&Commands::Tree {
            address: AddressArgs {
                partition: "N5".to_string(),
                selectors: vec!["category".to_string()],
            },
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidSelection(_)));
}

#[test]
fn sled_workspace_persists_between_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    let config = write_config(&workspace, SLED_CONFIG);

    {
        let cli = CliContext::new(workspace.clone(), Some(config.clone())).unwrap();
        add_node(&cli, None, "Bài 1");
        add_node(&cli, None, "Bài 2");
    }
    assert!(workspace.join("store").exists());

    let cli = CliContext::new(workspace, Some(config)).unwrap();
    let tree = tree_json(&cli);
    let second = node_id(&tree, "Bài 2");
    let first = node_id(&tree, "Bài 1");
    cli.execute(&Commands::Reorder {
        dragged: second,
        target: first,
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Delete {
            node: first,
            yes: true,
        })
        .unwrap();
    assert!(output.contains("Bài 1"));
    let tree = tree_json(&cli);
    let nodes = tree["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["order"], 1);
}

#[test]
fn export_then_import_into_another_level() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    let config = write_config(&workspace, MEMORY_CONFIG);
    let cli = CliContext::new(workspace.clone(), Some(config)).unwrap();

    add_node(&cli, None, "Bài 1");
    let lesson = node_id(&tree_json(&cli), "Bài 1");
    cli.execute(&Commands::AddItem {
        address: n5_args(),
        node: Some(lesson),
        payload: r#"{"word":"日"}"#.to_string(),
    })
    .unwrap();

    let snapshot_path = workspace.join("n5.json");
    cli.execute(&Commands::Export {
        nodes: Vec::new(),
        partition: Some("N5".to_string()),
        selectors: Vec::new(),
        output: Some(snapshot_path.clone()),
    })
    .unwrap();

    let import = |format: &str| {
        cli.execute(&Commands::Import {
            input: snapshot_path.clone(),
            retarget: Some("N4".to_string()),
            retarget_selectors: Vec::new(),
            format: format.to_string(),
        })
        .unwrap()
    };
    let first: serde_json::Value = serde_json::from_str(&import("json")).unwrap();
    assert_eq!(first["nodes_created"], 1);
    assert_eq!(first["items_created"], 1);
    assert!(first["errors"].as_array().unwrap().is_empty());

    let second: serde_json::Value = serde_json::from_str(&import("json")).unwrap();
    assert_eq!(second["nodes_created"], 0);
    assert_eq!(second["items_skipped"], 1);
}

#[test]
fn export_to_stdout_is_a_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    let config = write_config(&workspace, MEMORY_CONFIG);
    let cli = CliContext::new(workspace, Some(config)).unwrap().with_catalog("grammar");

    let output = cli
        .execute(&Commands::Export {
            nodes: Vec::new(),
            partition: Some("N3".to_string()),
            selectors: Vec::new(),
            output: None,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["catalog"], "grammar");
    assert_eq!(parsed["format_version"], 1);
}

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["catalog", "schemas"],
        vec!["catalog", "tree", "-p", "N5", "--format", "json"],
        vec!["catalog", "-c", "jlpt", "tree", "-p", "N5", "--select", "category=grammar"],
        vec!["catalog", "items", "-p", "N5", "--node", "3"],
        vec!["catalog", "add-node", "-p", "N5", "--name", "Bài 1", "--locked"],
        vec!["catalog", "add-item", "-p", "N5", "--node", "2", "--payload", "{}"],
        vec!["catalog", "rename", "--node", "2", "--name", "Bài 2"],
        vec!["catalog", "flag", "--node", "2", "--hidden", "true"],
        vec!["catalog", "delete", "--node", "2", "-y"],
        vec!["catalog", "reorder", "--dragged", "3", "--target", "2"],
        vec!["catalog", "move", "--item", "7", "--item", "8", "-p", "N4"],
        vec!["catalog", "export", "--node", "2", "--node", "5"],
        vec!["catalog", "export", "-p", "N5", "-o", "n5.json"],
        vec!["catalog", "import", "-i", "n5.json", "--retarget", "N4"],
        vec!["catalog", "browse", "--catalog", "lecture"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_conflicting_export_scopes() {
    assert!(Cli::try_parse_from(["catalog", "export", "--node", "2", "-p", "N5"]).is_err());
    assert!(Cli::try_parse_from(["catalog", "export"]).is_err());
    assert!(Cli::try_parse_from(["catalog", "move", "-p", "N5"]).is_err());
    assert!(Cli::try_parse_from(["catalog", "import", "-i", "x.json", "--retarget-select", "a=b"]).is_err());
}
