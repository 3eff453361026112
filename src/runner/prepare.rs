// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::RunPhase;
use crate::config::consts::{LOAD_KEY_PREFIX, PLACEHOLDER_DATA_SOURCE};
use crate::config::SnippetProperties;
use crate::errors::{RunnerError, SzError};
use crate::observability::messages::runner::{PhaseEntered, RecordsPreloaded};
use crate::observability::messages::StructuredLog;
use crate::records::{parse_record, record_key, RecordLines};
use crate::sdk::{SzEnvironment, SzFlags};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Repository state a snippet expects before it starts.
#[derive(Debug, Clone)]
pub struct PreparationPlan {
    pub snippet: String,
    pub properties: SnippetProperties,
    /// Base directory for load files.
    pub resources_dir: PathBuf,
    /// Configuration restored for snippets that declare no data sources.
    pub default_config_id: i64,
}

impl PreparationPlan {
    fn engine_error(&self, phase: RunPhase) -> impl Fn(SzError) -> RunnerError + '_ {
        move |source| RunnerError::Engine {
            snippet: self.snippet.clone(),
            phase,
            source,
        }
    }
}

/// Purge, configure and preload the repository for one snippet.
pub fn prepare_repository(env: &dyn SzEnvironment, plan: &PreparationPlan) -> Result<(), RunnerError> {
    enter(plan, RunPhase::Preparing);
    env.diagnostic()
        .purge_repository()
        .map_err(plan.engine_error(RunPhase::Preparing))?;

    enter(plan, RunPhase::Configuring);
    configure(env, plan).map_err(plan.engine_error(RunPhase::Configuring))?;

    enter(plan, RunPhase::Loading);
    for (index, load) in plan.properties.loads.iter().enumerate() {
        preload(env, plan, &format!("{LOAD_KEY_PREFIX}{index}"), load)?;
    }
    Ok(())
}

fn enter(plan: &PreparationPlan, phase: RunPhase) {
    PhaseEntered {
        snippet: &plan.snippet,
        phase,
    }
    .log();
}

fn configure(env: &dyn SzEnvironment, plan: &PreparationPlan) -> Result<(), SzError> {
    let manager = env.config_manager();

    if plan.properties.sources.is_empty() {
        return manager.set_default_config_id(plan.default_config_id);
    }

    let mut config = env.config_tool().create_config()?;
    for source in &plan.properties.sources {
        println!("Adding data source: {source}");
        config.add_data_source(source)?;
    }
    let config_id = manager.add_config(&config.export()?, &plan.snippet)?;
    manager.set_default_config_id(config_id)
}

fn preload(
    env: &dyn SzEnvironment,
    plan: &PreparationPlan,
    key: &str,
    load: &str,
) -> Result<(), RunnerError> {
    let file = plan.resources_dir.join(load);
    if !file.is_file() {
        return Err(RunnerError::MissingLoadFile {
            snippet: plan.snippet.clone(),
            key: key.to_string(),
            file,
        });
    }

    let reader = File::open(&file).map_err(|source| RunnerError::LoadFileRead {
        file: file.clone(),
        source,
    })?;

    let engine = env.engine();
    let mut count = 0;
    for line in RecordLines::new(BufReader::new(reader)) {
        let (line_number, line) = line.map_err(|source| RunnerError::LoadFileRead {
            file: file.clone(),
            source,
        })?;

        let Some(record) = parse_record(&line) else {
            return Err(RunnerError::MalformedRecord {
                file,
                line_number,
                line,
            });
        };

        engine
            .add_record(
                &record_key(&record, PLACEHOLDER_DATA_SOURCE),
                &line,
                SzFlags::NO_FLAGS,
            )
            .map_err(plan.engine_error(RunPhase::Loading))?;
        count += 1;
    }

    RecordsPreloaded {
        snippet: &plan.snippet,
        file: load,
        count,
    }
    .log();
    Ok(())
}
