use crate::settings::{StoreKind, UpsertConsistency};
use clap::{Arg, ArgMatches, Command};

pub const ARG_STORE: &str = "store";
pub const ARG_DSN: &str = "dsn";
pub const ARG_CONVEX_URL: &str = "convex-url";
pub const ARG_SETTINGS_CONSISTENCY: &str = "settings-consistency";

#[derive(Debug, Clone)]
pub struct Options {
    pub kind: StoreKind,
    pub dsn: Option<String>,
    pub convex_url: Option<String>,
    pub consistency: UpsertConsistency,
}

impl Options {
    /// Parse settings store arguments from matches.
    ///
    /// # Errors
    /// Returns an error if an explicitly selected backend is missing its
    /// connection argument.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Env vars set to "" count as unset.
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let kind = matches
            .get_one::<StoreKind>(ARG_STORE)
            .copied()
            .unwrap_or_default();
        let dsn = get_non_empty(ARG_DSN);

        if kind == StoreKind::Postgres && dsn.is_none() {
            anyhow::bail!("missing required argument: --{ARG_DSN} (required for --{ARG_STORE} postgres)");
        }

        Ok(Self {
            kind,
            dsn,
            convex_url: get_non_empty(ARG_CONVEX_URL),
            consistency: matches
                .get_one::<UpsertConsistency>(ARG_SETTINGS_CONSISTENCY)
                .copied()
                .unwrap_or_default(),
        })
    }

    /// The backend that will actually be built.
    #[must_use]
    pub const fn resolved_kind(&self) -> StoreKind {
        self.kind
            .resolve(self.dsn.is_some(), self.convex_url.is_some())
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORE)
                .long(ARG_STORE)
                .help("Settings backend: auto, memory, postgres or remote")
                .long_help(
                    "Settings backend.\n\n`auto` uses Postgres when --dsn is set, the remote query service when --convex-url is set, and memory otherwise. The memory store loses every write on restart.",
                )
                .env("DOHY_STORE")
                .default_value("auto")
                .value_parser(|value: &str| value.parse::<StoreKind>()),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .env("DOHY_DSN"),
        )
        .arg(
            Arg::new(ARG_CONVEX_URL)
                .long(ARG_CONVEX_URL)
                .help("Base URL of the remote settings query service")
                .env("DOHY_CONVEX_URL"),
        )
        .arg(
            Arg::new(ARG_SETTINGS_CONSISTENCY)
                .long(ARG_SETTINGS_CONSISTENCY)
                .help("Settings upsert consistency: atomic or read-modify-write")
                .long_help(
                    "Settings upsert consistency.\n\n`atomic` performs lookup and write as one unit. `read-modify-write` performs them separately; concurrent writes to the same key may lose an update or fail with 409.",
                )
                .env("DOHY_SETTINGS_CONSISTENCY")
                .default_value("atomic")
                .value_parser(|value: &str| value.parse::<UpsertConsistency>()),
        )
}
