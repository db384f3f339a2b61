use mongodb::bson::{oid::ObjectId, Binary};
use serde::{Deserialize, Serialize};

/// Doctor profile (stored in MongoDB). Images are kept inline as binary
/// blobs; the bytes persisted are exactly the bytes uploaded.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Doctor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub title: String,
    pub description: String,
    pub image: Binary,
    #[serde(rename = "signatureImg")]
    pub signature_img: Binary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::spec::BinarySubtype;

    #[test]
    fn image_bytes_survive_a_bson_round_trip() {
        let payload: Vec<u8> = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00];
        let doctor = Doctor {
            id: None,
            name: "Dr. Ayesha Khan".to_string(),
            email: "ayesha@fovia.com".to_string(),
            title: "Cardiologist".to_string(),
            description: "Consultant cardiologist".to_string(),
            image: Binary {
                subtype: BinarySubtype::Generic,
                bytes: payload.clone(),
            },
            signature_img: Binary {
                subtype: BinarySubtype::Generic,
                bytes: payload.clone(),
            },
        };

        let bson = mongodb::bson::to_document(&doctor).unwrap();
        let restored: Doctor = mongodb::bson::from_document(bson).unwrap();

        assert_eq!(restored.image.bytes, payload);
        assert_eq!(restored.signature_img.bytes, payload);
    }

    #[test]
    fn the_signature_field_keeps_its_stored_name() {
        let doctor = Doctor {
            id: None,
            name: "Dr. Ayesha Khan".to_string(),
            email: "ayesha@fovia.com".to_string(),
            title: "Cardiologist".to_string(),
            description: "Consultant cardiologist".to_string(),
            image: Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![1],
            },
            signature_img: Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![2],
            },
        };

        let bson = mongodb::bson::to_document(&doctor).unwrap();
        assert!(bson.contains_key("signatureImg"));
        assert!(!bson.contains_key("_id"));
    }
}
