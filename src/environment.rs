use clap::ValueEnum;
use std::fmt::{Debug, Display, Formatter};

/// Render service deployment to talk to.
#[derive(Clone, Default, Copy, PartialEq, Eq, ValueEnum, Debug)]
pub enum Environment {
    /// Local mock or development server.
    Local,
    /// The public API.
    #[default]
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    /// Base URL of the render API for this environment.
    pub fn api_url(&self) -> String {
        match self {
            Environment::Local => "http://localhost:8080".to_string(),
            Environment::Production => "https://api.veed.io".to_string(),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "Local"),
            Environment::Production => write!(f, "Production"),
        }
    }
}
