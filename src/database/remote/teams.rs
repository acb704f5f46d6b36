use crate::models::teams::Team;

use super::common::{
    decode, encode, teams_collection, ChangeReceiver, CloudClient, CloudError, Subscription,
};

pub async fn get_team(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    team_id: &str,
) -> Result<Option<Team>, CloudError> {
    let collection = teams_collection(organization_id, tournament_id);
    match client.get_doc(&collection, team_id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

pub async fn list_teams(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Team>, CloudError> {
    let collection = teams_collection(organization_id, tournament_id);
    let docs = client.list_docs(&collection).await?;
    docs.into_iter().map(|d| decode(d.data)).collect()
}

pub async fn upsert_team(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: &Team,
) -> Result<(), CloudError> {
    let collection = teams_collection(organization_id, tournament_id);
    client
        .put_doc(&collection, &record.team_id, encode(record)?)
        .await
}

pub async fn delete_team(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    team_id: &str,
) -> Result<(), CloudError> {
    let collection = teams_collection(organization_id, tournament_id);
    client.delete_doc(&collection, team_id).await
}

pub fn listen_teams(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_collection(&teams_collection(organization_id, tournament_id))
}

pub fn listen_team(
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    team_id: &str,
) -> (ChangeReceiver, Subscription) {
    client.listen_doc(&teams_collection(organization_id, tournament_id), team_id)
}
