use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};

use weekly::config::Config;
use weekly::content::parsing_utils::{parse_front_matter, serialize_positional};
use weekly::content::raw_document::{DocumentFormat, RawDocument};
use weekly::content::slug::slugify;
use weekly::dates::{monday_of, parse_iso_date, sunday_of};
use weekly::gateway::PostGateway;
use weekly::post_list::PostList;
use weekly::store::local::LocalStore;
use weekly::store::{ContentStore, StoreEntry};
use weekly::util::toml_date::TomlDate;

use crate::PostArgs;

const BODY_PLACEHOLDER: &str = "Your content goes here...";

/// Start date of one post in a year directory: the file name prefix of positional
/// files, the `startDate` of structured ones. Unreadable files are ignored.
async fn start_of(store: &dyn ContentStore, entry: &StoreEntry) -> Option<NaiveDate> {
    match RawDocument::guess_format(&entry.path)? {
        DocumentFormat::Positional => parse_iso_date(entry.name.get(..10)?).ok(),
        DocumentFormat::Structured => {
            let stored = store.read_file(&entry.path).await.ok()?;
            let text = String::from_utf8(stored.bytes).ok()?;
            let (meta, _) = parse_front_matter(&text).ok()?;
            parse_iso_date(meta.start_date.as_deref()?).ok()
        }
    }
}

/// Latest start date among the posts in year directories. Legacy files at the root are not counted.
async fn latest_start(store: &dyn ContentStore, root_dir: &str) -> Result<Option<NaiveDate>> {
    let post_list = PostList { store, root_dir };
    let root = root_dir.trim_end_matches('/');

    let mut latest = None;
    for entry in post_list.retrieve_files().await? {
        let in_year_dir = entry.path.rsplit_once('/').is_some_and(|(parent, _)| parent != root);
        if !in_year_dir {
            continue;
        }
        if let Some(start) = start_of(store, &entry).await {
            latest = latest.max(Some(start));
        }
    }
    Ok(latest)
}

/// The week after the latest post, or the configured first week of an empty blog
pub(crate) fn next_start(latest: Option<NaiveDate>, first_week: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    match latest {
        Some(latest) => latest + Duration::days(7),
        None => first_week.unwrap_or_else(|| monday_of(&today)),
    }
}

pub(crate) async fn post_cmd(config: &Config, args: PostArgs) -> Result<()> {
    let PostArgs { title, summary } = args;
    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(anyhow!("Title {:?} has no letters or digits to build a slug from", title));
    }

    let store = LocalStore::new(&config.content.local_dir);
    let root_dir = config.content.root.as_str();

    let latest = latest_start(&store, root_dir).await?;
    let first_week = config.defaults.first_week.map(|TomlDate(date)| date);
    let today = Local::now().date_naive();
    let start = next_start(latest, first_week, today);
    let end = sunday_of(&monday_of(&start));

    let text = serialize_positional(&title, &start, &end, summary.as_deref().unwrap_or(""), BODY_PLACEHOLDER);
    let gateway = PostGateway { store: &store, root_dir };
    gateway.create(&slug, &text, today).await?;

    let path = store.base_dir().join(gateway.post_path(&slug, &start));
    println!("Created {}", path.display());
    Ok(())
}
