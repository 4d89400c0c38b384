use serde::Serialize;
use serde_json::{Map, Value};

pub const LEARNING_INSTANCES_PATH: &str = "/learning-instances";

pub fn instance_path(id: &str) -> String {
    format!("{}/{}", LEARNING_INSTANCES_PATH, id)
}

/// Creation payload for `POST /learning-instances`
#[derive(Debug, Clone, Serialize)]
pub struct NewLearningInstance {
    pub name: String,
    pub description: String,
    pub config: Map<String, Value>,
}

impl NewLearningInstance {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let payload = NewLearningInstance::new("e2e-learning-1", "created by tests")
            .with_config("language", "en")
            .with_config("model", "default");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "e2e-learning-1",
                "description": "created by tests",
                "config": {"language": "en", "model": "default"}
            })
        );
    }

    #[test]
    fn test_instance_path() {
        assert_eq!(instance_path("li_42"), "/learning-instances/li_42");
    }
}
