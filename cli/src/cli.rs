//! CLI definitions and entry point

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use cartes_core::config::parse_timeout;
use cartes_core::{CartesClient, ClientConfig, Permission, Privacy};

use crate::commands;
use crate::output::{self, OutputMode};

/// simple-maps - command-line client for the cartes.io mapping platform
#[derive(Parser, Debug)]
#[command(
    name = "simple-maps",
    version,
    about = "CLI for the cartes.io mapping platform",
    long_about = "Create and share maps, drop markers and track their locations on cartes.io.\n\n\
                  Every command prints the API's JSON response. Anonymous maps and markers\n\
                  are edited with the token returned when they were created."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// API root URL
    #[arg(long, global = true, env = "CARTES_BASE_URL")]
    pub base_url: Option<String>,

    /// Self-hosted instance; uses https://<HOST>/api and wins over --base-url
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "CARTES_TIMEOUT", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Map management commands
    Map {
        #[command(subcommand)]
        action: MapAction,
    },

    /// Marker management commands
    Marker {
        #[command(subcommand)]
        action: MarkerAction,
    },

    /// Category commands
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Public user commands
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Authenticated user commands
    Me {
        #[command(subcommand)]
        action: MeAction,
    },
}

/// Editable map fields shared by `map create` and `map edit`.
#[derive(Args, Debug)]
pub struct MapFields {
    /// Title of the map
    #[arg(long)]
    pub title: Option<String>,

    /// URL slug for the map
    #[arg(long)]
    pub slug: Option<String>,

    /// Description of the map
    #[arg(long)]
    pub description: Option<String>,

    /// Privacy level: public, unlisted, private
    #[arg(long)]
    pub privacy: Option<Privacy>,

    /// Who can create markers: yes, no, only_logged_in
    #[arg(long)]
    pub users_can_create_markers: Option<Permission>,
}

#[derive(Subcommand, Debug)]
pub enum MapAction {
    /// List public maps
    List {
        /// Sort field
        #[arg(long)]
        order_by: Option<String>,

        /// Filter query
        #[arg(long)]
        query: Option<String>,

        /// Response format
        #[arg(long)]
        response_format: Option<String>,

        /// Include your own maps (true/false)
        #[arg(long)]
        with_mine: Option<bool>,

        /// Restrict to these map UUIDs (repeatable)
        #[arg(long = "id", value_name = "UUID")]
        ids: Vec<String>,

        /// Restrict to these category ids (repeatable)
        #[arg(long = "category-id", value_name = "ID")]
        category_ids: Vec<i64>,

        /// Expand a relation, e.g. markers (repeatable)
        #[arg(long = "with", value_name = "RELATION")]
        with_relations: Vec<String>,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Search public maps
    Search {
        /// Search query
        #[arg(long)]
        query: String,
    },

    /// Get a single map by UUID
    Get {
        /// UUID of the map to retrieve
        #[arg(long)]
        map_id: String,
    },

    /// Get a map's static image URL
    StaticImage {
        #[arg(long)]
        map_id: String,

        /// Zoom level (2-19)
        #[arg(long, value_parser = clap::value_parser!(u8).range(2..=19))]
        zoom: Option<u8>,
    },

    /// Create a new map
    Create {
        #[command(flatten)]
        fields: MapFields,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Edit an existing map
    Edit {
        #[arg(long)]
        map_id: String,

        /// Map edit token
        #[arg(long, visible_alias = "token")]
        map_token: Option<String>,

        #[command(flatten)]
        fields: MapFields,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Delete a map
    Delete {
        #[arg(long)]
        map_id: String,

        /// Map edit token
        #[arg(long, visible_alias = "token")]
        map_token: String,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Claim an anonymous map to your account
    Claim {
        #[arg(long)]
        map_id: String,

        /// Map edit token
        #[arg(long, visible_alias = "token")]
        map_token: String,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,
    },

    /// Release ownership of a map
    Unclaim {
        #[arg(long)]
        map_id: String,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,
    },

    /// List users with access to a map
    UserList {
        #[arg(long)]
        map_id: String,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,
    },

    /// Add a user to a map
    UserAdd {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        username: String,

        /// Allow the user to create markers (true/false)
        #[arg(long)]
        can_create_markers: Option<bool>,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,
    },

    /// Remove a user from a map
    UserDelete {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        username: String,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MarkerAction {
    /// List markers on a map
    List {
        #[arg(long)]
        map_id: String,

        /// Include expired markers (true/false)
        #[arg(long)]
        show_expired: Option<bool>,

        /// Response format, e.g. geojson
        #[arg(long)]
        response_format: Option<String>,
    },

    /// Create a marker on a map
    Create {
        #[arg(long)]
        map_id: String,

        /// Map edit token
        #[arg(long, visible_alias = "token")]
        map_token: String,

        /// Latitude (-90 to 90)
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude (-180 to 180)
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Category id
        #[arg(long)]
        category: Option<i64>,

        /// Category name; created if it does not exist
        #[arg(long)]
        category_name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Edit a marker's description
    Edit {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        marker_id: String,

        /// Marker edit token
        #[arg(long, visible_alias = "token")]
        marker_token: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Delete a marker
    Delete {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        marker_id: String,

        /// Marker edit token
        #[arg(long, visible_alias = "token")]
        marker_token: String,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Mark or unmark a marker as spam
    Spam {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        marker_id: String,

        /// true to flag, false to clear
        #[arg(long, action = clap::ArgAction::Set, required = true)]
        is_spam: bool,

        /// Map edit token
        #[arg(long, visible_alias = "token")]
        map_token: Option<String>,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },

    /// Get the location history of a marker
    LocationList {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        marker_id: String,
    },

    /// Add a location to a marker's history
    LocationCreate {
        #[arg(long)]
        map_id: String,

        #[arg(long)]
        marker_id: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Marker edit token
        #[arg(long)]
        marker_token: Option<String>,

        /// Zoom level (0-20)
        #[arg(long)]
        zoom: Option<f64>,

        /// Elevation in meters
        #[arg(long, allow_negative_numbers = true)]
        elevation: Option<f64>,

        /// Heading in degrees, [0, 360)
        #[arg(long)]
        heading: Option<f64>,

        /// Pitch (-90 to 90)
        #[arg(long, allow_negative_numbers = true)]
        pitch: Option<f64>,

        /// Roll (-180 to 180)
        #[arg(long, allow_negative_numbers = true)]
        roll: Option<f64>,

        /// Speed in m/s
        #[arg(long)]
        speed: Option<f64>,

        #[arg(long, env = "CARTES_API_KEY")]
        api_key: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// List all categories
    List,

    /// Search categories by name
    Search {
        #[arg(long)]
        query: String,
    },

    /// Get categories related to one category
    Related {
        #[arg(long)]
        category_id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// List public users
    List,

    /// Get a public user's profile
    Get {
        #[arg(long)]
        username: String,

        /// Expand a relation, e.g. maps (repeatable)
        #[arg(long = "with", value_name = "RELATION")]
        with_relations: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MeAction {
    /// Get your profile
    Get {
        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,
    },

    /// Update your profile
    Update {
        #[arg(long, env = "CARTES_API_KEY")]
        api_key: String,

        /// New username
        #[arg(long)]
        username: Option<String>,

        /// Make the profile public (true/false)
        #[arg(long)]
        is_public: Option<bool>,
    },
}

impl Cli {
    /// Client settings from the global options. `--host` beats `--base-url`.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = match (&self.host, &self.base_url) {
            (Some(host), _) => ClientConfig::for_host(host),
            (None, Some(base_url)) => ClientConfig {
                base_url: base_url.clone(),
                ..ClientConfig::default()
            },
            (None, None) => ClientConfig::default(),
        };
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }

    fn output_mode(&self) -> OutputMode {
        if self.compact {
            OutputMode::Compact
        } else {
            OutputMode::Pretty
        }
    }
}

/// Parse arguments, run one command and print its response.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let client = CartesClient::from_config(cli.client_config());
    log::debug!("using API at {}", client.base_url());
    let output_mode = cli.output_mode();

    let response = match cli.command {
        Command::Map { action } => commands::map(&client, action),
        Command::Marker { action } => commands::marker(&client, action),
        Command::Category { action } => commands::category(&client, action),
        Command::User { action } => commands::user(&client, action),
        Command::Me { action } => commands::me(&client, action),
    }?;

    output::print(&response, output_mode)
}
