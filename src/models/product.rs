//! Represents a catalogue product and the payload used to create one.

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product record as stored in the `Products` document table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Product {
    /// Generated UUID (v4), stored as a string.
    pub id: String,

    /// Display name; also part of the image key.
    pub name: String,

    /// Public URL of the uploaded image.
    pub image_url: String,

    pub description: String,
}

impl Product {
    /// Flatten into a JSON object suitable for `DocumentStore::put_item`.
    pub fn into_document(self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("id".into(), Value::String(self.id));
        doc.insert("name".into(), Value::String(self.name));
        doc.insert("image_url".into(), Value::String(self.image_url));
        doc.insert("description".into(), Value::String(self.description));
        doc
    }
}

/// Validated body of `POST /products`.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    /// Decoded image payload.
    pub image: Bytes,
}

impl NewProduct {
    /// Extract the three required fields from an arbitrary JSON body.
    ///
    /// Returns `None` when any field is absent or falsy (`null`, `false`,
    /// `0`, `""`, `[]`, `{}`), or when the body is not an object at all.
    pub fn from_json(body: &Value) -> Option<Self> {
        let fields = body.as_object()?;
        let name = required_field(fields, "name")?;
        let image = required_field(fields, "image")?;
        let description = required_field(fields, "description")?;

        Some(Self {
            name,
            description,
            image: decode_image(&image),
        })
    }

    /// Object key under which the image of product `id` is uploaded.
    pub fn image_key(&self, id: &str) -> String {
        format!("products/{}/{}.jpg", id, self.name)
    }
}

fn required_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Base64 payloads are decoded; anything else is uploaded as its raw bytes.
fn decode_image(image: &str) -> Bytes {
    match general_purpose::STANDARD.decode(image) {
        Ok(bytes) => Bytes::from(bytes),
        Err(_) => Bytes::copy_from_slice(image.as_bytes()),
    }
}
