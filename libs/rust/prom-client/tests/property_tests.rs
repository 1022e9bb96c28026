//! Property-based tests for client configuration handling.

use prom_client::{
    AuthStrategy, ClientBuilder, ClientConfig, ClientError, ClientMetrics, ClientResult, Layer,
    PrometheusClient, TrustRoots, parse_header_args,
};
use prometheus::Registry;
use proptest::prelude::*;
use std::{path::PathBuf, sync::Arc};
use test_utils::{
    bearer_token_strategy, header_arg_strategy, missing_path_strategy, prometheus_url_strategy,
};

fn build(config: &ClientConfig) -> ClientResult<PrometheusClient> {
    let builder =
        ClientBuilder::new().with_metrics(Arc::new(ClientMetrics::new(&Registry::new()).unwrap()));
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(builder.build(config))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every argument contributes its value, in order, under the text before
    /// its first `=`; arguments without `=` contribute an empty value.
    #[test]
    fn prop_header_values_accumulate_in_order(
        args in prop::collection::vec(header_arg_strategy(), 0..12),
    ) {
        let headers = parse_header_args(&args);

        for (name, values) in headers.iter() {
            let expected: Vec<&str> = args
                .iter()
                .map(|arg| arg.split_once('=').unwrap_or((arg.as_str(), "")))
                .filter(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
                .collect();
            prop_assert_eq!(values, expected.as_slice());
        }

        let total: usize = headers.iter().map(|(_, values)| values.len()).sum();
        prop_assert_eq!(total, args.len());
    }

    /// Asking for both credential sources without a CA file is always
    /// rejected, whatever the paths and URL are.
    #[test]
    fn prop_conflicting_sources_rejected(
        url in prometheus_url_strategy(),
        kubeconfig in missing_path_strategy(),
        token in prop::option::of(missing_path_strategy()),
    ) {
        let mut config = ClientConfig::new(url)
            .with_cluster_credentials(true)
            .with_external_credentials(&kubeconfig);
        if let Some(token) = token {
            config = config.with_token_file(token);
        }

        let err = build(&config).unwrap_err();
        prop_assert!(
            matches!(err, ClientError::ConflictingAuthSources { kubeconfig: ref k } if k == &PathBuf::from(&kubeconfig)),
            "unexpected error: {}", err
        );
    }

    /// A CA file always selects the pinned strategy, regardless of the
    /// credential flags.
    #[test]
    fn prop_ca_file_wins(
        ca in missing_path_strategy(),
        in_cluster in any::<bool>(),
        kubeconfig in prop::option::of(missing_path_strategy()),
    ) {
        let mut config = ClientConfig::new("http://metrics.local:9090")
            .with_ca_file(&ca)
            .with_cluster_credentials(in_cluster);
        if let Some(kubeconfig) = kubeconfig {
            config = config.with_external_credentials(kubeconfig);
        }

        prop_assert_eq!(
            AuthStrategy::resolve(&config).unwrap(),
            AuthStrategy::CaPinned { ca_file: PathBuf::from(&ca) }
        );
        let err = build(&config).unwrap_err();
        prop_assert!(err.is_ca_error(), "unexpected error: {}", err);
    }

    /// With no auth configured the client is always the plain default.
    #[test]
    fn prop_no_auth_is_default_transport(url in prometheus_url_strategy()) {
        let client = build(&ClientConfig::new(url)).unwrap();
        let transport = client.api().inner().transport();

        prop_assert_eq!(transport.trust_roots(), &TrustRoots::System);
        prop_assert_eq!(transport.layers(), &[Layer::Http][..]);
    }

    /// The overlay always composes on top of the strategy transport.
    #[test]
    fn prop_overlay_is_outermost(token in bearer_token_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, &token).unwrap();

        let client =
            build(&ClientConfig::new("http://metrics.local:9090").with_token_file(&path)).unwrap();
        prop_assert_eq!(
            client.api().inner().transport().layers(),
            &[Layer::BearerAuth, Layer::Http][..]
        );
    }
}
