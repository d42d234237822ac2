// End-to-end synthesis: configuration text in, JSON declaration out

use gucdk::synth::{declare, load, render, write_output};
use gucdk::SynthArgs;
use gucdk_config::{EnvSource, SynthConfig, ENV_PREFIX};
use serde_json::Value;
use std::collections::HashMap;

const CONFIG: &str = r#"
[stack]
stack = "media-service"
stage = "CODE"
cloudformation_stack_name = "media-service-image-resizer-CODE"

[task]
id = "image-resizer"
app = "image-resizer"
file_name = "image-resizer.zip"
handler = "handler.main"
runtime = "nodejs14.x"

[[task.rules]]
rate_minutes = 5

[task.monitoring]
tolerated_error_percentage = 2.5
"#;

struct MapEnv(HashMap<String, String>);

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

// Only this test composes through the process-wide shared values
#[test]
fn test_synthesize_from_config_and_env() {
    let env = MapEnv(HashMap::from([
        ("GUCDK_STAGE".to_string(), "PROD".to_string()),
        ("GUCDK_DIST_BUCKET_NAME".to_string(), "dist-bucket".to_string()),
    ]));
    let config = SynthConfig::load_with_env(Some(CONFIG), &env).unwrap();

    let declaration = declare(config).unwrap();
    let json: Value = serde_json::from_str(&render(&declaration).unwrap()).unwrap();

    assert_eq!(
        json["function"]["code"]["key"],
        "media-service/PROD/image-resizer/image-resizer.zip"
    );
    assert_eq!(json["function"]["code"]["bucket"], "dist-bucket");
    assert_eq!(json["function"]["memory_size"], 512);
    assert_eq!(json["function"]["environment"]["STAGE"], "PROD");
    assert_eq!(json["tags"]["Stage"], "PROD");
    assert_eq!(json["rules"][0]["schedule_expression"], "rate(5 minutes)");
    assert_eq!(json["alarm"]["threshold"], 2.5);

    // The topic was not overridden, so it comes from an SSM parameter
    let parameters = json["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["logical_id"], "AlarmTopicArn");
}

#[test]
fn test_invalid_config_never_reaches_composition() {
    let env = MapEnv(HashMap::new());
    let broken = CONFIG.replace("tolerated_error_percentage = 2.5", "no_monitoring = false");
    assert!(SynthConfig::load_with_env(Some(&broken), &env).is_err());
}

#[test]
fn test_write_output_with_force() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("declaration.json");

    assert!(write_output(&path, "{}", false).unwrap());
    assert!(write_output(&path, "{\"id\":1}", true).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"id\":1}");
}

#[test]
fn test_logging_is_ready_before_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gucdk.toml");
    std::fs::write(&path, CONFIG.replace("[task]\n", "[task]\nmemory_size = 20480\n")).unwrap();

    let args = SynthArgs {
        config: Some(path.clone()),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };
    let config = load(&args).unwrap();
    assert!(tracing::dispatcher::has_been_set());
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.task.memory_size, Some(20480));

    std::fs::write(&path, CONFIG.replace("stage = \"CODE\"\n", "")).unwrap();
    assert!(load(&args).is_err());
}
