//! End-to-end generation tests against a small but complete document.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::PathBuf;

use openapi_tsgen::{GenerateConfig, generate, generate_to};

const TEAM_OPENAPI_JSON: &str = r##"{
  "openapi": "3.0.3",
  "info": { "title": "Team Service", "version": "0.3.0" },
  "servers": [{ "url": "https://teams.example.com" }],
  "paths": {
    "/teams": {
      "get": {
        "summary": "List every team.",
        "responses": {
          "200": {
            "description": "OK",
            "content": {
              "application/json": {
                "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Team" } }
              }
            }
          }
        }
      }
    },
    "/teams/{id}": {
      "parameters": [
        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
      ],
      "get": {
        "responses": {
          "200": {
            "description": "OK",
            "content": {
              "application/json": {
                "schema": { "$ref": "#/components/schemas/Team" }
              }
            }
          }
        }
      }
    }
  },
  "components": {
    "schemas": {
      "Team": {
        "type": "object",
        "description": "A team of users.",
        "properties": {
          "id": { "type": "integer" },
          "name": { "type": "string" }
        },
        "required": ["name"]
      }
    }
  }
}"##;

fn team_config() -> GenerateConfig {
    GenerateConfig {
        namespace: "teamService".to_string(),
        output_dir: PathBuf::from("unused"),
    }
}

#[test]
fn test_team_schema_file() {
    let files = generate(TEAM_OPENAPI_JSON, &team_config()).unwrap();

    let team = files
        .iter()
        .find(|f| f.path == PathBuf::from("schemas/Team.ts"))
        .expect("schemas/Team.ts should be generated");
    assert!(team.content.contains("/** A team of users. */"));
    assert!(team.content.contains("export interface Team {"));
    assert!(team.content.contains("  id?: number;"));
    assert!(team.content.contains("  name: string;"));
}

#[test]
fn test_team_client_methods() {
    let files = generate(TEAM_OPENAPI_JSON, &team_config()).unwrap();
    let client = &files
        .iter()
        .find(|f| f.path == PathBuf::from("client.ts"))
        .unwrap()
        .content;

    assert!(client.contains("import type { Team } from \"./schemas/Team\";"));
    assert!(client.contains("export const teamService = {"));
    assert!(client.contains("teams: {"));
    assert!(client.contains("byId: {"));
    assert!(client.contains(
        "get(id: number, options?: RequestInit): Promise<Team | null>"
    ));
    assert!(client.contains("request<Team>(`/teams/${id}`, \"GET\", undefined, undefined, options)"));
    assert!(client.contains("Promise<Team[] | null>"));
}

#[test]
fn test_generate_is_deterministic() {
    let first = generate(TEAM_OPENAPI_JSON, &team_config()).unwrap();
    let second = generate(TEAM_OPENAPI_JSON, &team_config()).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.content, b.content);
    }
}

#[test]
fn test_generate_to_writes_output_tree() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenerateConfig {
        namespace: "teamService".to_string(),
        output_dir: dir.path().to_path_buf(),
    };
    generate_to(TEAM_OPENAPI_JSON, &config).unwrap();

    let client = fs::read_to_string(dir.path().join("client.ts")).unwrap();
    assert!(client.contains("export const teamService = {"));

    let team = fs::read_to_string(dir.path().join("schemas").join("Team.ts")).unwrap();
    assert!(team.contains("export interface Team {"));
}
