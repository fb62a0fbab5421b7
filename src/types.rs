use serde::Deserialize;

/// How the CLI runs the configured checks.
///
/// - `Parallel`: dispatch every check at once; results arrive in whatever
///   order they complete.
/// - `Chain`: run checks one after another through a `TaskChain`, optionally
///   aborting the rest on the first error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Parallel,
    Chain,
}

/// Where the DNS check reads local resolvers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalDnsKind {
    /// `resolv.conf`-style file.
    ResolvConf,
    /// Android `getprop` dump.
    Getprop,
}

impl Default for LocalDnsKind {
    fn default() -> Self {
        if cfg!(target_os = "android") {
            LocalDnsKind::Getprop
        } else {
            LocalDnsKind::ResolvConf
        }
    }
}
