use crate::models::matches::Match;

use super::common::{
    decode, encode, matches_collection, ChangeReceiver, CloudClient, CloudError, Subscription,
};

pub async fn get_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_id: &str,
) -> Result<Option<Match>, CloudError> {
    let collection = matches_collection(organization_id, tournament_id);
    match client.get_doc(&collection, match_id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

pub async fn list_matches(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Match>, CloudError> {
    let collection = matches_collection(organization_id, tournament_id);
    let docs = client.list_docs(&collection).await?;
    docs.into_iter().map(|d| decode(d.data)).collect()
}

/// Full-record write; the cloud copy becomes exactly this record.
pub async fn upsert_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: &Match,
) -> Result<(), CloudError> {
    let collection = matches_collection(organization_id, tournament_id);
    client
        .put_doc(&collection, &record.match_id, encode(record)?)
        .await
}

pub async fn delete_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_id: &str,
) -> Result<(), CloudError> {
    let collection = matches_collection(organization_id, tournament_id);
    client.delete_doc(&collection, match_id).await
}

pub fn listen_matches(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_collection(&matches_collection(organization_id, tournament_id))
}

pub fn listen_match(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    match_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_doc(&matches_collection(organization_id, tournament_id), match_id)
}
