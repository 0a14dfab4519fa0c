//! Command dispatch: one handler per subcommand

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::{ChartService, ChartStatus};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, FilterArgs, RootCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{FilterCriteria, RootDecision};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load()?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Tree {
            data,
            filters,
            focus,
            json,
        } => _tree(&container, data, filters, focus.as_deref(), *json),
        Commands::Roots { data, filters } => _roots(&container, data, filters),
        Commands::Cycles { data, threshold } => _cycles(&container, data, *threshold),
        Commands::Entities { data, search } => _entities(&container, data, search.as_deref()),
        Commands::Jurisdictions { data } => _jurisdictions(&container, data),
        Commands::Root { command } => _root(&container, command),
        Commands::Config { command } => _config(&container, command),
        Commands::Completion { shell } => _completion(*shell),
    }
}

/// Filter criteria from flags, falling back to configured defaults.
pub fn criteria_from(settings: &Settings, filters: &FilterArgs) -> FilterCriteria {
    FilterCriteria {
        search: filters.search.clone(),
        jurisdiction: filters.jurisdiction.clone(),
        ownership_threshold: filters.threshold.unwrap_or(settings.ownership_threshold),
        include_persons: filters.persons || settings.include_persons,
        focus: None,
    }
}

fn entity_label(chart: &ChartService, id: &str) -> String {
    match chart.dataset().entity(id) {
        Some(entity) => format!("{} ({})", entity.name, entity.id),
        None => id.to_string(),
    }
}

fn stored_root(container: &ServiceContainer, data: &Path) -> CliResult<Option<String>> {
    Ok(container.selections().get(data)?.map(|s| s.entity_id))
}

#[instrument(skip(container, filters))]
fn _tree(
    container: &ServiceContainer,
    data: &Path,
    filters: &FilterArgs,
    focus: Option<&str>,
    json: bool,
) -> CliResult<()> {
    let chart = container.chart(data)?;
    let user_root = stored_root(container, data)?;

    let mut criteria = criteria_from(&container.settings, filters);
    if let Some(query) = focus {
        let entity = chart
            .dataset()
            .find_entity(query)
            .map_err(ApplicationError::from)?;
        criteria.focus = Some(entity.id.clone());
    }

    let outcome = chart.render(&criteria, user_root.as_deref());

    for cycle in &outcome.cycles {
        output::warning(&format!("ownership cycle: {}", cycle.join(" -> ")));
    }
    if let Some(missing) = &outcome.focus_missing {
        output::warning(&format!(
            "{} is hidden by the current filters, showing the full chart",
            entity_label(&chart, missing)
        ));
    }

    if json {
        let rendered = serde_json::to_string_pretty(&outcome.report()).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize chart".to_string(),
                source: Box::new(e),
            }
        })?;
        output::info(&rendered);
        return Ok(());
    }

    match outcome.status() {
        ChartStatus::Rendered => {
            for tree in &outcome.forest {
                output::tree(&tree.to_tree_string(container.settings.show_ownership));
            }
        }
        ChartStatus::NoMatches => output::warning("no entities match the current filters"),
        ChartStatus::RootFilteredOut(id) => output::warning(&format!(
            "root {} is hidden by the current filters",
            entity_label(&chart, &id)
        )),
        ChartStatus::NeedsRootChoice(candidates) if candidates.is_empty() => {
            output::warning("every entity has an owner, no natural root exists");
            output::detail(&format!(
                "browse with: charted entities {} --search <TEXT>",
                data.display()
            ));
            output::detail(&format!(
                "choose one with: charted root set {} <ENTITY>",
                data.display()
            ));
        }
        ChartStatus::NeedsRootChoice(candidates) => {
            output::header("Multiple root entities found, choose one:");
            for id in &candidates {
                output::detail(&entity_label(&chart, id));
            }
            output::detail(&format!("charted root set {} <ENTITY>", data.display()));
        }
    }
    Ok(())
}

#[instrument(skip(container, filters))]
fn _roots(container: &ServiceContainer, data: &Path, filters: &FilterArgs) -> CliResult<()> {
    let chart = container.chart(data)?;
    let user_root = stored_root(container, data)?;

    output::header("True roots");
    if chart.true_roots().is_empty() {
        output::detail("none (every entity has an owner)");
    }
    for id in chart.true_roots() {
        output::detail(&entity_label(&chart, id));
    }

    let criteria = criteria_from(&container.settings, filters);
    let decision = match chart.decide_root(&criteria, user_root.as_deref()) {
        RootDecision::UserRoot(id) => format!("user-selected root {}", entity_label(&chart, &id)),
        RootDecision::SingleRoot(id) => format!("single root {}", entity_label(&chart, &id)),
        RootDecision::EmptyFiltered(id) => {
            format!("root {} hidden by filters", entity_label(&chart, &id))
        }
        RootDecision::NeedsUserChoice(candidates) if candidates.is_empty() => {
            "choice needed, no candidates".to_string()
        }
        RootDecision::NeedsUserChoice(candidates) => {
            format!("choice needed among {}", candidates.join(", "))
        }
    };
    output::action("Decision", &decision);
    Ok(())
}

#[instrument(skip(container))]
fn _cycles(container: &ServiceContainer, data: &Path, threshold: Option<f64>) -> CliResult<()> {
    let chart = container.chart(data)?;
    let criteria = FilterCriteria::default()
        .with_threshold(threshold.unwrap_or(container.settings.ownership_threshold));

    let cycles = chart.cycles(&criteria);
    if cycles.is_empty() {
        output::success("no ownership cycles");
        return Ok(());
    }

    output::header(&format!("{} ownership cycles", cycles.len()));
    for cycle in &cycles {
        output::cycle(cycle);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _entities(container: &ServiceContainer, data: &Path, search: Option<&str>) -> CliResult<()> {
    let chart = container.chart(data)?;
    let entities = chart.dataset().browse_entities(search);
    if entities.is_empty() {
        output::warning("no entities match");
        return Ok(());
    }
    for entity in entities {
        match &entity.jurisdiction {
            Some(j) => output::action(&entity.id, &format!("{} [{}]", entity.name, j)),
            None => output::action(&entity.id, &entity.name),
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _jurisdictions(container: &ServiceContainer, data: &Path) -> CliResult<()> {
    let chart = container.chart(data)?;
    for jurisdiction in chart.dataset().jurisdictions() {
        output::info(&jurisdiction);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _root(container: &ServiceContainer, command: &RootCommands) -> CliResult<()> {
    match command {
        RootCommands::Set { data, query } => {
            let chart = container.chart(data)?;
            let entity = chart
                .dataset()
                .find_entity(query)
                .map_err(ApplicationError::from)?;
            container.selections().set(data, &entity.id)?;
            output::success(&format!(
                "root for {} set to {} ({})",
                data.display(),
                entity.name,
                entity.id
            ));
        }
        RootCommands::Clear { data } => {
            if container.selections().clear(data)? {
                output::success(&format!("root selection for {} cleared", data.display()));
            } else {
                output::info("no root selected");
            }
        }
        RootCommands::Show { data } => match container.selections().get(data)? {
            Some(selection) => output::action(
                "Root",
                &format!("{} (selected {})", selection.entity_id, selection.selected_at),
            ),
            None => output::info("no root selected"),
        },
    }
    Ok(())
}

#[instrument(skip(container))]
fn _config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => return Err(CliError::Usage("no config directory available".into())),
        },
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("no config directory available".into()))?;
            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("wrote {}", path.display()));
        }
    }
    Ok(())
}

fn _completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
