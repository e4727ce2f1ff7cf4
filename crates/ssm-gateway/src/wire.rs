//! Wire formats of the remote service and their adapters.
//!
//! The crate's model uses one snake_case schema. The service and its earlier
//! snapshots are not consistent about field names (`refId` / `ref_id` /
//! `core_id`, `whyMatch` / `why_description`, `unit` / `units`) or about
//! whether a set is sent as a list or a single string. Everything that
//! crosses the boundary is decoded here and converted into model types.

use serde::{Deserialize, Deserializer, Serialize};
use ssm_model::{
    ImportDraft, ImportedVariable, MappingCandidate, RefId, ReferenceVariable, unique_values,
};

/// `GET /core`. `items` is required: a body without it is an error, not
/// an empty schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceListResponse {
    pub items: Vec<WireReference>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReference {
    #[serde(
        default,
        alias = "refId",
        alias = "core_id",
        deserialize_with = "null_as_empty"
    )]
    pub ref_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, alias = "unit", deserialize_with = "string_or_list")]
    pub units: Vec<String>,
    #[serde(default, alias = "method", deserialize_with = "string_or_list")]
    pub methods: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, alias = "alias", deserialize_with = "string_or_list")]
    pub aliases: Vec<String>,
}

impl WireReference {
    /// Convert into the model, or `None` when the item has no usable id.
    ///
    /// Items without a name are labelled with their id.
    pub fn into_model(self) -> Option<ReferenceVariable> {
        let ref_id = RefId::new(self.ref_id).ok()?;
        let name = if self.name.trim().is_empty() {
            ref_id.as_str().to_string()
        } else {
            self.name
        };
        Some(
            ReferenceVariable::new(ref_id, name)
                .with_description(self.description)
                .with_units(self.units)
                .with_methods(self.methods)
                .with_aliases(self.aliases),
        )
    }
}

/// `POST /uploadfile`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub variables: Vec<ExtractedVariable>,
}

/// One variable found in an uploaded file. Every field is optional on the
/// wire and defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractedVariable {
    #[serde(
        default,
        alias = "traitId",
        alias = "traitID",
        deserialize_with = "null_as_empty"
    )]
    pub trait_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, alias = "methode", deserialize_with = "null_as_empty")]
    pub method: String,
    #[serde(
        default,
        alias = "units",
        alias = "unite",
        deserialize_with = "null_as_empty"
    )]
    pub unit: String,
    #[serde(default, rename = "trait", deserialize_with = "null_as_empty")]
    pub trait_label: String,
}

impl ExtractedVariable {
    /// Table row for this variable, tagged with the dataset it came from.
    pub fn into_draft(self, dataset_id: impl Into<String>) -> ImportDraft {
        ImportDraft {
            dataset_id: dataset_id.into(),
            trait_id: self.trait_id,
            description: self.description,
            method: self.method,
            unit: self.unit,
            trait_label: self.trait_label,
        }
    }
}

/// `POST /align` request body: the imported variable plus an empty
/// `aliases` field.
#[derive(Debug, Clone, Serialize)]
pub struct AlignRequest<'a> {
    pub data_import_id: &'a str,
    pub dataset_id: &'a str,
    pub trait_id: &'a str,
    #[serde(rename = "trait")]
    pub trait_label: &'a str,
    pub description: &'a str,
    pub method: &'a str,
    pub unit: &'a str,
    pub aliases: &'a str,
}

impl<'a> From<&'a ImportedVariable> for AlignRequest<'a> {
    fn from(variable: &'a ImportedVariable) -> Self {
        Self {
            data_import_id: variable.import_id.as_str(),
            dataset_id: &variable.dataset_id,
            trait_id: &variable.trait_id,
            trait_label: &variable.trait_label,
            description: &variable.description,
            method: &variable.method,
            unit: &variable.unit,
            aliases: "",
        }
    }
}

/// `POST /align` response: `{ "items": [...] }`, or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AlignResponse {
    Wrapped { items: Vec<WireCandidate> },
    Bare(Vec<WireCandidate>),
}

impl AlignResponse {
    pub fn into_items(self) -> Vec<WireCandidate> {
        match self {
            Self::Wrapped { items } | Self::Bare(items) => items,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCandidate {
    #[serde(
        default,
        alias = "refId",
        alias = "core_id",
        deserialize_with = "null_as_empty"
    )]
    pub ref_id: String,
    pub score: f64,
    #[serde(
        default,
        alias = "whyMatch",
        alias = "why_description",
        alias = "whyDescription",
        deserialize_with = "null_as_empty"
    )]
    pub why_match: String,
}

impl WireCandidate {
    pub fn into_model(self) -> Option<MappingCandidate> {
        let ref_id = RefId::new(self.ref_id).ok()?;
        Some(MappingCandidate::new(ref_id, self.score).with_reason(self.why_match))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => unique_values([value]),
        Some(OneOrMany::Many(values)) => unique_values(values.into_iter().flatten()),
    })
}

#[cfg(test)]
mod tests {
    use ssm_model::{ImportDraft, ImportId};

    use super::*;

    #[test]
    fn reference_accepts_camel_case_and_list_drift() {
        let camel: WireReference = serde_json::from_str(
            r#"{"refId":"LA","name":"Leaf area","units":["cm2","cm2"],"methods":[],"description":"d","aliases":["leaf surface"]}"#,
        )
        .unwrap();
        let backend: WireReference = serde_json::from_str(
            r#"{"core_id":"LA","unit":"cm2","description":"d","alias":null}"#,
        )
        .unwrap();

        let camel = camel.into_model().unwrap();
        let backend = backend.into_model().unwrap();
        assert_eq!(camel.ref_id, backend.ref_id);
        assert_eq!(camel.units, vec!["cm2"]);
        assert_eq!(backend.units, vec!["cm2"]);
        assert_eq!(backend.name, "LA");
        assert!(backend.aliases.is_empty());
    }

    #[test]
    fn bodies_without_payload_field_are_rejected() {
        assert!(
            serde_json::from_str::<ReferenceListResponse>(r#"{"detail":"load_referential error"}"#)
                .is_err()
        );
        assert!(serde_json::from_str::<UploadResponse>(r#"{"error":"bad file"}"#).is_err());

        let empty: ReferenceListResponse = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(empty.count, None);
    }

    #[test]
    fn reference_without_id_is_skipped() {
        let wire: WireReference = serde_json::from_str(r#"{"ref_id":null,"name":"x"}"#).unwrap();
        assert!(wire.into_model().is_none());
    }

    #[test]
    fn extracted_variable_defaults_missing_and_null_fields() {
        let wire: ExtractedVariable = serde_json::from_str(
            r#"{"trait_id":"VIGOUR","description":"VIGOUR","trait":null,"method":null}"#,
        )
        .unwrap();
        assert_eq!(wire.trait_id, "VIGOUR");
        assert_eq!(wire.method, "");
        assert_eq!(wire.unit, "");
        assert_eq!(wire.trait_label, "");

        let draft = wire.into_draft("trial.xlsx");
        assert_eq!(draft.dataset_id, "trial.xlsx");
    }

    #[test]
    fn align_response_accepts_wrapped_and_bare() {
        let wrapped: AlignResponse =
            serde_json::from_str(r#"{"items":[{"refId":"A","score":0.5,"whyMatch":"w"}]}"#)
                .unwrap();
        let bare: AlignResponse =
            serde_json::from_str(r#"[{"ref_id":"A","score":0.5,"why_description":"w"}]"#).unwrap();

        let wrapped: Vec<MappingCandidate> = wrapped
            .into_items()
            .into_iter()
            .filter_map(WireCandidate::into_model)
            .collect();
        let bare: Vec<MappingCandidate> = bare
            .into_items()
            .into_iter()
            .filter_map(WireCandidate::into_model)
            .collect();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped[0].why_match, "w");
    }

    #[test]
    fn align_request_carries_empty_aliases() {
        let row = ImportedVariable::from_draft(
            ImportId::new("i1").unwrap(),
            ImportDraft::new("SPAD").with_dataset("trial.xlsx"),
        );
        let body = serde_json::to_value(AlignRequest::from(&row)).unwrap();
        assert_eq!(body["aliases"], "");
        assert_eq!(body["trait_id"], "SPAD");
        assert_eq!(body["data_import_id"], "i1");
        assert_eq!(body["trait"], "");
    }
}
