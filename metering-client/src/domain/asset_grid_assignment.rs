use serde::Deserialize;

/// A grid-connected asset assignment as returned by the remote API.
///
/// The id is issued by the remote service and is the only field the sample
/// flows depend on; the rest is carried through for display.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGridAssignment {
    pub id: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub grid_node_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
