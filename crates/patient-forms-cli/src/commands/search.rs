use std::io::{self, BufRead, BufReader, Write};

use anyhow::{Context, Result};
use patient_forms_core::forms::{SearchFilters, SearchForm, SearchOutcome, SearchState};
use patient_forms_core::{FhirClient, PageLink, SearchTarget};

use crate::cli::{OutputFormat, SearchArgs};
use crate::output::{print_error, print_page};

/// Where the first page comes from
fn first_target(args: &SearchArgs, filters: &SearchFilters) -> Result<Option<SearchTarget>> {
    if let Some(url) = &args.page_url {
        let link = PageLink::parse(url).with_context(|| format!("Invalid page URL: {url}"))?;
        return Ok(Some(link.into()));
    }
    if *filters == SearchFilters::default() && args.count.is_none() {
        return Ok(None);
    }
    let mut query = filters.to_query();
    if let Some(count) = args.count {
        query = query.count(count);
    }
    Ok(Some(query.into()))
}

fn filters(args: &SearchArgs) -> SearchFilters {
    SearchFilters {
        given: args.given.clone().unwrap_or_default(),
        family: args.family.clone().unwrap_or_default(),
        telecom: args.telecom.clone().unwrap_or_default(),
    }
}

fn applied(outcome: SearchOutcome) -> Option<std::sync::Arc<SearchState>> {
    match outcome {
        SearchOutcome::Applied(state) => Some(state),
        SearchOutcome::Superseded | SearchOutcome::AtBoundary => None,
    }
}

pub async fn search(client: &FhirClient, args: &SearchArgs, format: OutputFormat) -> Result<()> {
    let form = SearchForm::new(client.clone());
    let filters = filters(args);
    form.set_filters(filters.clone());

    let outcome = match first_target(args, &filters)? {
        Some(target) => form.run(target).await,
        None => form.load_initial().await,
    };
    let Some(state) = applied(outcome) else {
        return Ok(());
    };
    if let Some(msg) = state.status.error() {
        anyhow::bail!("{msg}");
    }
    print_page(&state, format);

    if args.browse {
        browse(&form, format).await?;
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Nav {
    Next,
    Previous,
    Quit,
}

fn parse_nav(input: &str) -> Option<Nav> {
    match input.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => Some(Nav::Next),
        "p" | "prev" | "previous" => Some(Nav::Previous),
        "q" | "quit" | "" => Some(Nav::Quit),
        _ => None,
    }
}

/// Read one line on the blocking pool, handing the reader back with it.
/// `None` at end of input.
async fn read_line<R>(mut reader: R) -> Result<(R, Option<String>)>
where
    R: BufRead + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        Ok::<_, io::Error>((reader, (read > 0).then_some(line)))
    })
    .await
    .context("stdin reader task failed")?
    .context("Failed to read from stdin")
}

async fn browse(form: &SearchForm, format: OutputFormat) -> Result<()> {
    let mut input = BufReader::new(io::stdin());

    loop {
        let state = form.state();
        let mut choices = Vec::new();
        if state.links.has_next() {
            choices.push("[n]ext");
        }
        if state.links.has_previous() {
            choices.push("[p]revious");
        }
        choices.push("[q]uit");
        print!("{} > ", choices.join(" "));
        io::stdout().flush()?;

        let (reader, line) = read_line(input).await?;
        input = reader;
        let Some(line) = line else {
            return Ok(());
        };
        let outcome = match parse_nav(&line) {
            Some(Nav::Next) => form.next().await,
            Some(Nav::Previous) => form.previous().await,
            Some(Nav::Quit) => return Ok(()),
            None => {
                print_error("Unknown choice");
                continue;
            }
        };

        match outcome {
            SearchOutcome::Applied(state) => match state.status.error() {
                Some(msg) => print_error(msg),
                None => print_page(&state, format),
            },
            SearchOutcome::AtBoundary => print_error("No page in that direction"),
            SearchOutcome::Superseded => {}
        }
    }
}
