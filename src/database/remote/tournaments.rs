use crate::models::tournaments::Tournament;

use super::common::{
    decode, encode, tournaments_collection, ChangeReceiver, CloudClient, CloudError, Subscription,
};

pub async fn get_tournament(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Option<Tournament>, CloudError> {
    let collection = tournaments_collection(organization_id);
    match client.get_doc(&collection, tournament_id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

pub async fn list_tournaments(
    client: &CloudClient,
    organization_id: &str,
) -> Result<Vec<Tournament>, CloudError> {
    let collection = tournaments_collection(organization_id);
    let docs = client.list_docs(&collection).await?;
    docs.into_iter().map(|d| decode(d.data)).collect()
}

pub async fn upsert_tournament(
    client: &CloudClient,
    record: &Tournament,
) -> Result<(), CloudError> {
    let collection = tournaments_collection(&record.organization_id);
    client
        .put_doc(&collection, &record.tournament_id, encode(record)?)
        .await
}

pub async fn delete_tournament(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> Result<(), CloudError> {
    let collection = tournaments_collection(organization_id);
    client.delete_doc(&collection, tournament_id).await
}

/// Watch the tournament document itself (name, courts, rounds, settings).
pub fn listen_tournament(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_doc(&tournaments_collection(organization_id), tournament_id)
}
