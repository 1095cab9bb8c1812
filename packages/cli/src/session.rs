//! One widget instance driven from the terminal.

use dialoguer::{Input, MultiSelect};
use location_insight_cli_utils::{MultiProgress, PipelineStatus};
use location_insight_markers::{FilterSet, FilterableMarkerManager};
use location_insight_metrics_models::FeatureTag;
use location_insight_widget::{QueryController, WidgetHooks};
use location_insight_widget_models::{QueryState, WidgetConfig, WidgetSnapshot};

use crate::map::ConsoleMap;
use crate::render::render_snapshot;

pub struct Session {
    config: WidgetConfig,
    controller: QueryController,
    markers: FilterableMarkerManager<ConsoleMap>,
    multi: MultiProgress,
}

impl Session {
    /// # Errors
    ///
    /// Returns an error if the HTTP client or controller cannot be built.
    pub fn new(config: WidgetConfig, multi: MultiProgress) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("location-insight/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let hooks = WidgetHooks::new()
            .on_location_change(|location, result| {
                log::debug!(
                    "Location changed to '{location}' ({} records)",
                    result.records.len()
                );
            })
            .on_error(|error| log::debug!("Query failed: {error}"));
        let controller = QueryController::from_config(&config, client)?.with_hooks(hooks);

        let filters: FilterSet = config.initial_filters.iter().copied().collect();
        let markers = FilterableMarkerManager::new(ConsoleMap::default(), filters);

        Ok(Self {
            config,
            controller,
            markers,
            multi,
        })
    }

    /// Runs one query to completion with a status spinner.
    pub async fn query(&mut self, location: &str) -> WidgetSnapshot {
        let status = PipelineStatus::spinner(&self.multi);
        let mut rx = self.controller.subscribe();

        let submit = self.controller.submit(location);
        tokio::pin!(submit);
        loop {
            tokio::select! {
                _ = &mut submit => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = rx.borrow_and_update().clone();
                    status.update(&snapshot);
                }
            }
        }
        status.finish();

        let snapshot = self.controller.snapshot();
        if self.config.show_map {
            self.markers.on_snapshot(&snapshot);
        }
        snapshot
    }

    /// Prints the current snapshot, and the map below it when enabled.
    pub fn print(&self, snapshot: &WidgetSnapshot) {
        println!();
        print!("{}", render_snapshot(snapshot, self.config.theme));
        if self.config.show_map && snapshot.state == QueryState::Ready {
            println!();
            print!("{}", self.markers.provider().render());
        }
        println!();
    }

    /// Prompts for locations until an empty line is entered.
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt fails.
    pub async fn interactive(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(location) = self.config.location.clone() {
            let snapshot = self.query(&location).await;
            self.print(&snapshot);
        }

        if !self.config.show_search {
            return Ok(());
        }

        loop {
            let location: String = Input::new()
                .with_prompt("Location (empty to quit)")
                .allow_empty(true)
                .interact_text()?;
            if location.trim().is_empty() {
                break;
            }

            let snapshot = self.query(&location).await;
            self.print(&snapshot);

            if self.config.show_map && self.config.show_filters && snapshot.state == QueryState::Ready
            {
                self.edit_filters()?;
                self.print(&snapshot);
            }
        }

        Ok(())
    }

    fn edit_filters(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let labels: Vec<&str> = FeatureTag::ALL.iter().map(|t| t.label()).collect();
        let defaults: Vec<bool> = FeatureTag::ALL
            .iter()
            .map(|t| self.markers.filters().contains(*t))
            .collect();

        let selected = MultiSelect::new()
            .with_prompt("Map filters (space=toggle, enter=confirm)")
            .items(&labels)
            .defaults(&defaults)
            .interact()?;

        for (i, tag) in FeatureTag::ALL.iter().enumerate() {
            if selected.contains(&i) != defaults[i] {
                self.markers.on_filter_toggle(*tag);
            }
        }
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.markers.teardown();
    }
}
