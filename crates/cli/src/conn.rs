use crate::args::Cli;
use mysql_async::{Opts, OptsBuilder, SslOpts};
use tracing::info;

/// Connection options for the export session.
///
/// TLS is on unless disabled, without certificate or host name verification.
pub fn mysql_opts(cli: &Cli) -> Opts {
    let mut builder = OptsBuilder::default()
        .ip_or_hostname(cli.host.clone())
        .tcp_port(cli.port)
        .user(Some(cli.user.clone()))
        .pass(Some(cli.password.clone()))
        .db_name(Some(cli.database.clone()));

    if !cli.no_tls {
        builder = builder.ssl_opts(
            SslOpts::default()
                .with_danger_accept_invalid_certs(true)
                .with_danger_skip_domain_validation(true),
        );
    }

    info!(
        "Connecting to {}:{}/{} as '{}' (tls: {})",
        cli.host, cli.port, cli.database, cli.user, !cli.no_tls
    );
    builder.into()
}
