use super::*;

#[derive(Serialize, Tabled)]
struct Row {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "VERSION")]
    version: String,
}

#[derive(Serialize)]
struct Item {
    name: String,
}

impl Formattable for Item {
    fn format_pretty(&self) -> String {
        format!("Name: {}", self.name)
    }
}

fn rows() -> Vec<Row> {
    vec![
        Row {
            name: "my-job".to_string(),
            version: "0.1.0".to_string(),
        },
        Row {
            name: "other-job".to_string(),
            version: "1.0.0".to_string(),
        },
    ]
}

#[test]
fn test_output_format_from_str() {
    assert_eq!(OutputFormat::from("json"), OutputFormat::Json);
    assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
    assert_eq!(OutputFormat::from("yaml"), OutputFormat::Yaml);
    assert_eq!(OutputFormat::from("yml"), OutputFormat::Yaml);
    assert_eq!(OutputFormat::from("pretty"), OutputFormat::Pretty);
    assert_eq!(OutputFormat::from("anything"), OutputFormat::Pretty);
}

#[test]
fn test_format_output_pretty() {
    let item = Item {
        name: "my-job".to_string(),
    };
    assert_eq!(
        format_output(&item, OutputFormat::Pretty).unwrap(),
        "Name: my-job"
    );
}

#[test]
fn test_format_output_json() {
    let item = Item {
        name: "my-job".to_string(),
    };
    let output = format_output(&item, OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["name"], "my-job");
}

#[test]
fn test_format_table_pretty_has_headers() {
    let output = format_table(&rows(), OutputFormat::Pretty).unwrap();
    assert!(output.contains("NAME"));
    assert!(output.contains("VERSION"));
    assert!(output.contains("other-job"));
}

#[test]
fn test_format_table_json_is_list() {
    let output = format_table(&rows(), OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[1]["version"], "1.0.0");
}

#[test]
fn test_format_table_yaml() {
    let output = format_table(&rows(), OutputFormat::Yaml).unwrap();
    assert!(output.contains("name: my-job"));
}
