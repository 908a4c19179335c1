use std::path::{Path, PathBuf};

use ethereum_tokenstream_party::{
    identity::to_key,
    query::{self, ActivityFilter, OrderDirection},
    Indexer, MemoryStore, Params,
};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use miette::{miette, IntoDiagnostic, WrapErr};
use substreams_ethereum::pb::eth::v2::Block;
use tracing::{debug, info};

use crate::{
    config::{compare_feed, render_activity, IntegrationTest, IntegrationTestsConfig},
    fixtures::read_block,
};

pub struct TestRunner {
    package: String,
    show_feed: bool,
    colorize: bool,
    substreams_path: PathBuf,
}

impl TestRunner {
    pub fn new(package: String, show_feed: bool, colorize: bool) -> Self {
        let substreams_path = PathBuf::from("../substreams").join(&package);
        Self { package, show_feed, colorize, substreams_path }
    }

    pub fn run_tests(&self) -> miette::Result<()> {
        let config_yaml_path = self
            .substreams_path
            .join("integration_test.tokenstream.yaml");

        let config = Self::parse_config(&config_yaml_path)?;
        let params = Params::parse(&config.params)
            .map_err(|e| miette!("Invalid params for {}: {e:#}", self.package))?;

        info!("Running {} tests ...\n", config.tests.len());
        info!("--------------------------------\n");

        let mut failed_tests: Vec<String> = Vec::new();

        for (count, test) in config.tests.iter().enumerate() {
            info!("TEST {}: {}", count + 1, test.name);

            match self.run_test(test, &params) {
                Ok(_) => {
                    info!("\n✅ {} passed.\n", test.name);
                }
                Err(e) => {
                    failed_tests.push(test.name.clone());
                    info!("\n❗️ {} failed: {:?}\n", test.name, e);
                }
            }

            info!("--------------------------------\n");
        }

        info!(
            "\nTests finished! \nRESULTS: {}/{} passed.\n",
            config.tests.len() - failed_tests.len(),
            config.tests.len()
        );
        if !failed_tests.is_empty() {
            info!("Failed tests:");
            for failed_test in &failed_tests {
                info!("- {}", failed_test);
            }
            return Err(miette!("{} of {} tests failed", failed_tests.len(), config.tests.len()));
        }

        Ok(())
    }

    fn parse_config(config_yaml_path: &Path) -> miette::Result<IntegrationTestsConfig> {
        info!("Config YAML: {}", config_yaml_path.display());
        let yaml = Yaml::file(config_yaml_path);
        let figment = Figment::new().merge(yaml);
        let config = figment
            .extract::<IntegrationTestsConfig>()
            .into_diagnostic()
            .wrap_err("Failed to load test configuration:")?;
        Ok(config)
    }

    fn run_test(&self, test: &IntegrationTest, params: &Params) -> miette::Result<()> {
        let mut indexer = Indexer::from_params(MemoryStore::new(), params);

        for block_path in &test.blocks {
            let block: Block = read_block(&self.substreams_path.join(block_path))?;
            let summary = indexer
                .process_block(&block)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to index block {}", block.number))?;
            debug!(
                block = summary.block_number,
                events = summary.events,
                created = summary.created,
                "replayed block"
            );
        }

        validate_state(indexer.store(), test, self.colorize)?;

        if self.show_feed {
            print_feeds(indexer.store())?;
        }
        Ok(())
    }
}

fn validate_state(store: &MemoryStore, test: &IntegrationTest, colorize: bool) -> miette::Result<()> {
    info!("Found {} entities", store.len());
    info!("Validating state...");

    for expected in &test.expected_organizations {
        let view = query::organization(store, &expected.id.to_lowercase())
            .into_diagnostic()?
            .ok_or_else(|| miette!("Organization {} was not indexed", expected.id))?;
        let streams = query::streams(store, &view.organization.id).into_diagnostic()?;

        if let Some(diff) = expected.compare(&view, &streams, colorize) {
            return Err(miette!("Organization diff:\n{}", diff));
        }
        info!("Organization {} matches the expected state", expected.id);
    }

    for expected in &test.expected_activities {
        let organization = expected.organization.to_lowercase();
        let feed = query::activities(
            store,
            &ActivityFilter::for_organization(&organization),
            OrderDirection::Desc,
        )
        .into_diagnostic()?;

        if let Some(diff) = compare_feed(&organization, &expected.activities, &feed, colorize) {
            return Err(miette!("{}", diff));
        }
        info!("Activity feed of {} matches", organization);
    }

    info!("All expected entities were found and match the expected state");
    Ok(())
}

fn print_feeds(store: &MemoryStore) -> miette::Result<()> {
    for org in query::organizations(store).into_diagnostic()? {
        info!("{} ({}) owned by {}", org.name, org.id, to_key(&org.owner));
        let feed = query::activities(
            store,
            &ActivityFilter::for_organization(&org.id),
            OrderDirection::Desc,
        )
        .into_diagnostic()?;
        for activity in &feed {
            info!("  {} @ {}", render_activity(activity), activity.created_at);
        }
    }
    Ok(())
}
