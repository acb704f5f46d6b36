use crate::models::team_matches::TeamMatch;

use super::common::{
    decode, encode, team_matches_collection, ChangeReceiver, CloudClient, CloudError, Subscription,
};

pub async fn get_team_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
    match_id: &str,
) -> Result<Option<TeamMatch>, CloudError> {
    let collection = team_matches_collection(organization_id, tournament_id, match_group_id);
    match client.get_doc(&collection, match_id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

pub async fn list_team_matches(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
) -> Result<Vec<TeamMatch>, CloudError> {
    let collection = team_matches_collection(organization_id, tournament_id, match_group_id);
    let docs = client.list_docs(&collection).await?;
    docs.into_iter().map(|d| decode(d.data)).collect()
}

pub async fn upsert_team_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: &TeamMatch,
) -> Result<(), CloudError> {
    let collection =
        team_matches_collection(organization_id, tournament_id, &record.match_group_id);
    client
        .put_doc(&collection, &record.match_id, encode(record)?)
        .await
}

pub async fn delete_team_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
    match_id: &str,
) -> Result<(), CloudError> {
    let collection = team_matches_collection(organization_id, tournament_id, match_group_id);
    client.delete_doc(&collection, match_id).await
}

/// Live bouts under one match group. Groups appear and disappear during a
/// tournament, so these subscriptions are created lazily per group.
pub fn listen_team_matches(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_collection(&team_matches_collection(
        organization_id,
        tournament_id,
        match_group_id,
    ))
}

pub fn listen_team_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
    match_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_doc(
        &team_matches_collection(organization_id, tournament_id, match_group_id),
        match_id,
    )
}
