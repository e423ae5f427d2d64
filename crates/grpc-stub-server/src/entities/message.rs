use prost_reflect::{DynamicMessage, MessageDescriptor};
use serde_json::Value;

/// Build a message of the given type from its protobuf JSON form
pub fn from_json(descriptor: &MessageDescriptor, value: &Value) -> Result<DynamicMessage, serde_json::Error> {
    DynamicMessage::deserialize(descriptor.clone(), value)
}

/// Canonical JSON text for a message, used as the stub match key
pub fn to_json(message: &DynamicMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

pub fn to_value(message: &DynamicMessage) -> Result<Value, serde_json::Error> {
    serde_json::to_value(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use prost_reflect::DescriptorPool;
    use serde_json::json;

    fn descriptor(name: &str) -> MessageDescriptor {
        let file = protox::file::File::from_source(
            "ping.proto",
            r#"
                syntax = "proto3";
                package foo;
                message Ping {
                    string message = 1;
                    repeated int64 values = 2;
                    map<string, bool> flags = 3;
                }
            "#,
        )
        .unwrap();
        let mut pool = DescriptorPool::new();
        pool.add_file_descriptor_proto(file.file_descriptor_proto().clone())
            .unwrap();
        pool.get_message_by_name(name).unwrap()
    }

    #[test]
    fn test_structured_payload_survives_wire_encoding() {
        let desc = descriptor("foo.Ping");
        let payload = json!({"message": "ok", "values": ["1", "2"], "flags": {"a": true}});

        let message = from_json(&desc, &payload).unwrap();
        let bytes = message.encode_to_vec();
        let decoded = DynamicMessage::decode(desc, bytes.as_slice()).unwrap();

        assert_eq!(to_value(&decoded).unwrap(), payload);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let desc = descriptor("foo.Ping");
        assert!(from_json(&desc, &json!({"nope": 1})).is_err());
    }

    #[test]
    fn test_match_key_omits_defaults() {
        let desc = descriptor("foo.Ping");
        let message = from_json(&desc, &json!({"message": "hi", "values": []})).unwrap();
        assert_eq!(to_json(&message).unwrap(), r#"{"message":"hi"}"#);
    }
}
