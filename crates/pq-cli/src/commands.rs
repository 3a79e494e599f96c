//! Command tree and dispatch
//!
//! Every command prints JSON except `export --format csv`.

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pq_core::{NewRequest, RequestId, SiteInput};
use pq_sync::{PullReport, PushReport, QuoteDesk};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

/// Build the `pq-desk` command tree
#[must_use]
pub fn cli() -> Command {
    Command::new("pq-desk")
        .version(crate::VERSION)
        .about("Quote request desk with spreadsheet sync")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML config file"),
        )
        .subcommand(Command::new("list").about("List requests, newest first"))
        .subcommand(
            Command::new("submit")
                .about("Submit a new quote request")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(
                    Arg::new("link")
                        .long("link")
                        .required(true)
                        .help("Model link"),
                )
                .arg(Arg::new("details").long("details")),
        )
        .subcommand(
            Command::new("status")
                .about("Move a request to a workflow status")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("status").required(true)),
        )
        .subcommand(
            Command::new("assign")
                .about("Assign a fulfiller; omit the name to clear")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("name")),
        )
        .subcommand(
            Command::new("notes")
                .about("Replace admin notes")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(
            Command::new("tracking")
                .about("Set the tracking number")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("number").required(true)),
        )
        .subcommand(
            Command::new("archive")
                .about("Archive a request")
                .arg(Arg::new("id").required(true))
                .arg(
                    Arg::new("restore")
                        .long("restore")
                        .action(ArgAction::SetTrue)
                        .help("Move back to the active tab"),
                ),
        )
        .subcommand(Command::new("reload").about("Replace local requests from the sheet"))
        .subcommand(Command::new("sync").about("Push local requests to the sheet now"))
        .subcommand(
            Command::new("export").about("Export all requests").arg(
                Arg::new("format")
                    .long("format")
                    .default_value("csv")
                    .value_parser(["csv", "json"]),
            ),
        )
        .subcommand(
            Command::new("detect")
                .about("Classify a model link")
                .arg(Arg::new("link").required(true)),
        )
        .subcommand(Command::new("settings").about("Show current settings"))
        .subcommand(
            Command::new("fulfillers")
                .about("Replace the fulfiller list")
                .arg(
                    Arg::new("names")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("sites")
                .about("Replace the site registry from a JSON file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("reload-settings").about("Reload settings from their source"))
        .subcommand(Command::new("health").about("Show desk status"))
}

/// Run the selected subcommand against `desk` and render its output.
///
/// # Errors
/// Propagates desk errors and input file errors.
pub async fn run(desk: &QuoteDesk, matches: &ArgMatches) -> anyhow::Result<String> {
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no command given");
    };

    match name {
        "list" => render(&desk.list().await),
        "submit" => {
            let mut payload =
                NewRequest::new(arg(args, "name"), arg(args, "email"), arg(args, "link"));
            if let Some(details) = args.get_one::<String>("details") {
                payload = payload.with_details(details);
            }
            render(&desk.submit(payload).await?)
        }
        "status" => render(&desk.set_status(&id(args), &arg(args, "status")).await?),
        "assign" => {
            let name = args.get_one::<String>("name").map(String::as_str);
            render(&desk.set_fulfilled_by(&id(args), name).await?)
        }
        "notes" => render(&desk.set_admin_notes(&id(args), &arg(args, "text")).await?),
        "tracking" => render(&desk.set_tracking_number(&id(args), &arg(args, "number")).await?),
        "archive" => {
            let archived = !args.get_flag("restore");
            render(&desk.set_archived(&id(args), archived).await?)
        }
        "reload" => render(&pull_json(desk.reload().await?)),
        "sync" => render(&push_json(desk.sync_now().await?)),
        "export" => match args.get_one::<String>("format").map(String::as_str) {
            Some("json") => Ok(desk.export_json().await?),
            _ => Ok(desk.export_csv().await),
        },
        "detect" => render(&desk.detect(&arg(args, "link"))),
        "settings" => render(&desk.settings()),
        "fulfillers" => {
            let names: Vec<String> = args
                .get_many::<String>("names")
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            render(&desk.update_fulfillers(&names).await?)
        }
        "sites" => {
            let sites = read_sites(args)?;
            render(&desk.update_sites(&sites).await?)
        }
        "reload-settings" => render(&desk.reload_settings().await?),
        "health" => render(&desk.status().await),
        other => anyhow::bail!("unknown command: {other}"),
    }
}

fn render<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn arg(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

fn id(args: &ArgMatches) -> RequestId {
    RequestId::from(arg(args, "id"))
}

fn read_sites(args: &ArgMatches) -> anyhow::Result<Vec<SiteInput>> {
    let path = args
        .get_one::<PathBuf>("file")
        .context("missing site file")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid site list in {}", path.display()))
}

fn pull_json(report: PullReport) -> serde_json::Value {
    json!({
        "active": report.active,
        "archived": report.archived,
        "skipped": report.skipped,
        "duplicates": report.duplicates,
        "loaded": report.loaded(),
    })
}

fn push_json(report: PushReport) -> serde_json::Value {
    json!({
        "active": report.active,
        "archived": report.archived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_sync::DeskConfig;
    use pretty_assertions::assert_eq;

    fn local_desk(dir: &tempfile::TempDir) -> QuoteDesk {
        QuoteDesk::new(DeskConfig::in_dir(dir.path()))
    }

    async fn exec(desk: &QuoteDesk, argv: &[&str]) -> anyhow::Result<String> {
        let argv = std::iter::once("pq-desk").chain(argv.iter().copied());
        let matches = cli().try_get_matches_from(argv)?;
        run(desk, &matches).await
    }

    #[test]
    fn command_tree_is_consistent() {
        cli().debug_assert();
    }

    #[tokio::test]
    async fn submit_then_move_through_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let desk = local_desk(&dir);

        let out = exec(
            &desk,
            &[
                "submit",
                "--name",
                "Ada",
                "--email",
                "ada@example.com",
                "--link",
                "https://www.printables.com/model/1",
            ],
        )
        .await
        .unwrap();
        let created: serde_json::Value = serde_json::from_str(&out).unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let out = exec(&desk, &["status", id.as_str(), "shipped"]).await.unwrap();
        let updated: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(updated["status"], "shipped");

        exec(&desk, &["archive", id.as_str()]).await.unwrap();
        let health: serde_json::Value =
            serde_json::from_str(&exec(&desk, &["health"]).await.unwrap()).unwrap();
        assert_eq!(health["archived"], 1);
        assert_eq!(health["remoteEnabled"], false);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let desk = local_desk(&dir);
        assert!(exec(&desk, &["status", "missing", "teleported"]).await.is_err());
    }

    #[tokio::test]
    async fn sync_without_remote_fails() {
        let dir = tempfile::tempdir().unwrap();
        let desk = local_desk(&dir);
        assert!(exec(&desk, &["sync"]).await.is_err());
    }

    #[tokio::test]
    async fn csv_export_starts_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let desk = local_desk(&dir);
        let csv = exec(&desk, &["export"]).await.unwrap();
        assert!(csv.starts_with("ID,"));
    }

    #[tokio::test]
    async fn sites_file_replaces_registry() {
        let dir = tempfile::tempdir().unwrap();
        let desk = local_desk(&dir);
        let file = dir.path().join("sites.json");
        std::fs::write(
            &file,
            r#"[{"name": "Maker Hub", "hosts": ["www.makerhub.test"], "enabled": true}]"#,
        )
        .unwrap();

        exec(&desk, &["sites", file.to_str().unwrap()]).await.unwrap();
        let detected: serde_json::Value = serde_json::from_str(
            &exec(&desk, &["detect", "https://makerhub.test/things/9"]).await.unwrap(),
        )
        .unwrap();
        assert_eq!(detected["label"], "Maker Hub");
        assert_eq!(detected["supported"], true);
    }

    #[tokio::test]
    async fn blank_fulfillers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let desk = local_desk(&dir);
        assert!(exec(&desk, &["fulfillers", "  "]).await.is_err());
    }
}
