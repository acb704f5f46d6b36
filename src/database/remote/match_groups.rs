use crate::models::match_groups::MatchGroup;

use super::common::{
    decode, encode, match_groups_collection, ChangeReceiver, CloudClient, CloudError, Subscription,
};

pub async fn get_match_group(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
) -> Result<Option<MatchGroup>, CloudError> {
    let collection = match_groups_collection(organization_id, tournament_id);
    match client.get_doc(&collection, match_group_id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

pub async fn list_match_groups(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<MatchGroup>, CloudError> {
    let collection = match_groups_collection(organization_id, tournament_id);
    let docs = client.list_docs(&collection).await?;
    docs.into_iter().map(|d| decode(d.data)).collect()
}

pub async fn upsert_match_group(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: &MatchGroup,
) -> Result<(), CloudError> {
    let collection = match_groups_collection(organization_id, tournament_id);
    client
        .put_doc(&collection, &record.match_group_id, encode(record)?)
        .await
}

pub async fn delete_match_group(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
) -> Result<(), CloudError> {
    let collection = match_groups_collection(organization_id, tournament_id);
    client.delete_doc(&collection, match_group_id).await
}

pub fn listen_match_groups(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_collection(&match_groups_collection(organization_id, tournament_id))
}

pub fn listen_match_group(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_doc(
        &match_groups_collection(organization_id, tournament_id),
        match_group_id,
    )
}
