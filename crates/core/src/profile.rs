//! Profile entity and wire types.
//!
//! The profile API speaks camelCase JSON; every wire type carries a
//! `rename_all` attribute so the Rust side can keep snake_case fields.

use serde::{Deserialize, Serialize};

/// An area of expertise the specialist can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongArea {
    pub code: String,
    pub name: String,
}

/// The specialist's primary discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub code: String,
    pub name: String,
}

/// The profile as returned by `GET /api/profile`.
///
/// `image_path` is the server-side path of the current profile image; an
/// empty string means no image is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialist {
    pub id: String,
    pub name: String,
    pub introduction: String,
    pub counselling_time: String,
    pub visitable_area: String,
    pub image_path: String,
    pub strong_areas: Vec<StrongArea>,
    pub specialty: Specialty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDetailResponse {
    pub specialist: Specialist,
}

/// Body of `PUT /api/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub introduction: String,
    pub counselling_time: String,
    pub visitable_area: String,
    pub strong_area_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_serializes_in_wire_case() {
        let request = ProfileUpdateRequest {
            introduction: "hello".to_string(),
            counselling_time: "weekday evenings".to_string(),
            visitable_area: "Tokyo".to_string(),
            strong_area_codes: vec!["01".to_string(), "07".to_string()],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["counsellingTime"], "weekday evenings");
        assert_eq!(json["visitableArea"], "Tokyo");
        assert_eq!(json["strongAreaCodes"][1], "07");
    }

    #[test]
    fn detail_response_deserializes_from_wire_case() {
        let json = r#"{
            "specialist": {
                "id": "42",
                "name": "A. Specialist",
                "introduction": "intro",
                "counsellingTime": "10:00-18:00",
                "visitableArea": "Kanto",
                "imagePath": "/images/42.jpg",
                "strongAreas": [{"code": "01", "name": "Family"}],
                "specialty": {"code": "S1", "name": "Counselling"}
            }
        }"#;

        let response: ProfileDetailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.specialist.image_path, "/images/42.jpg");
        assert_eq!(response.specialist.strong_areas[0].code, "01");
    }
}
