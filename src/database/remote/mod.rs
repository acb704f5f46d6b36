// Remote document-store operations for cloud sync
//
// Each module handles CRUD plus live-subscription operations for one entity
// collection. All operations go through the CloudBackend contract in
// `common`, scoped by (organization, tournament[, matchGroup]) path
// segments:
//
//   organizations/{org}/tournaments/{tid}
//       /matches
//       /matchGroups
//       /matchGroups/{gid}/teamMatches
//       /teams
//
// Key concepts:
// - document ids are the client-generated record ids (uuid v4)
// - upserts are full-document replaces, never patch-merges
// - listeners may replay the current snapshot as Added events; consumers
//   apply changes idempotently

pub mod common;
pub mod http;
pub mod memory;

pub mod match_groups;
pub mod matches;
pub mod team_matches;
pub mod teams;
pub mod tournaments;
