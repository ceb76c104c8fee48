use crate::infra::Backends;
use agendate::backend::ListingStore;
use agendate::config::AppConfig;
use agendate::error::AppError;
use agendate::links::{contact_link, map_link};
use agendate::listings::{
    reduce, Amenity, Category, FeedFilter, FieldUpdate, ListingCard, ListingFeed, LocationCommit,
    OperationType, PhotoRef, UserId, WizardAction, WizardPhase, WizardState,
};
use agendate::search::{HttpGeocoder, LocationSearch, MapPicker};
use clap::{Args, ValueEnum};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum DemoCategory {
    #[default]
    House,
    Apartment,
    Office,
    Land,
}

impl From<DemoCategory> for Category {
    fn from(value: DemoCategory) -> Self {
        match value {
            DemoCategory::House => Category::House,
            DemoCategory::Apartment => Category::Apartment,
            DemoCategory::Office => Category::Office,
            DemoCategory::Land => Category::Land,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum DemoOperation {
    #[default]
    Sale,
    Rental,
}

impl From<DemoOperation> for OperationType {
    fn from(value: DemoOperation) -> Self {
        match value {
            DemoOperation::Sale => OperationType::Sale,
            DemoOperation::Rental => OperationType::Rental,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Property category chosen on the first wizard step
    #[arg(long, value_enum, default_value_t = DemoCategory::House)]
    pub(crate) category: DemoCategory,
    /// Whether the listing is offered for sale or for rent
    #[arg(long, value_enum, default_value_t = DemoOperation::Sale)]
    pub(crate) operation: DemoOperation,
    /// Listing title entered on the details step
    #[arg(long, default_value = "Casa frente al parque")]
    pub(crate) title: String,
    /// Asking price, kept as typed
    #[arg(long, default_value = "250000")]
    pub(crate) price: String,
    /// Seed an existing listing at the same pin so the submission is rejected
    #[arg(long)]
    pub(crate) duplicate: bool,
    /// Look the pin up with the configured geocoder instead of using the built-in one
    #[arg(long)]
    pub(crate) search: Option<String>,
}

const DEMO_OWNER: &str = "demo-owner";

fn demo_pin() -> LocationCommit {
    LocationCommit {
        lat: -12.1219,
        lng: -77.0297,
        address: "Av. Larco 345, Miraflores".to_string(),
    }
}

/// Resolve the pin the way the location step does: debounced search, pick, then reverse lookup.
async fn searched_pin(config: &AppConfig, query: &str) -> Result<Option<LocationCommit>, AppError> {
    let geocoder = Arc::new(HttpGeocoder::new(
        config.search.geocoder_base_url.clone(),
        &config.search.geocoder_user_agent,
    )?);
    let mut search = LocationSearch::new(geocoder.clone(), config.search.debounce);
    let mut results = search.subscribe();
    search.on_query_changed(query);
    if results.changed().await.is_err() {
        return Ok(None);
    }
    let Some(place) = results.borrow().first().cloned() else {
        return Ok(None);
    };
    println!("- Search {query:?} picked {}", place.selection_label());

    let Some(focus) = search.select(&place) else {
        return Ok(None);
    };
    let mut picker = MapPicker::new(geocoder);
    picker.focus(focus);
    picker.camera_idle(focus.center).await;
    Ok(Some(picker.commit()))
}

fn wizard_script(args: &DemoArgs, category: Category, pin: LocationCommit) -> Vec<WizardAction> {
    let mut actions = vec![
        WizardAction::SelectCategory(category),
        WizardAction::GoNext,
        WizardAction::SetField(FieldUpdate::Location(pin)),
        WizardAction::GoNext,
        WizardAction::SetField(FieldUpdate::Title(args.title.clone())),
        WizardAction::SetField(FieldUpdate::Price(args.price.clone())),
        WizardAction::SetField(FieldUpdate::Area("120".to_string())),
        WizardAction::SetField(FieldUpdate::Description(
            "Listing created from the command line demo".to_string(),
        )),
    ];
    if category.has_rooms() {
        actions.push(WizardAction::SetField(FieldUpdate::IncrementBedrooms));
        actions.push(WizardAction::SetField(FieldUpdate::IncrementBedrooms));
    }
    if Amenity::Garden.applies_to(category) {
        actions.push(WizardAction::SetField(FieldUpdate::Amenity {
            amenity: Amenity::Garden,
            enabled: true,
        }));
    }
    actions.push(WizardAction::GoNext);
    actions.push(WizardAction::SetField(FieldUpdate::Gallery(vec![
        PhotoRef::new("file:///demo/fachada.jpg"),
        PhotoRef::new("file:///demo/sala.jpg"),
    ])));
    actions
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let backends = Backends::default();
    let api = backends.listing_api(&config);
    let owner = UserId(DEMO_OWNER.to_string());
    let category = Category::from(args.category);
    let operation = OperationType::from(args.operation);

    println!("Listing publication demo");
    println!(
        "- {} for {} | numeric policy {:?}",
        category.label(),
        operation.label(),
        config.listings.numeric_policy
    );

    let pin = match &args.search {
        Some(query) => match searched_pin(&config, query).await? {
            Some(pin) => pin,
            None => {
                println!("  No usable place found for {query:?}");
                return Ok(());
            }
        },
        None => demo_pin(),
    };
    println!("- Pin {}, {} ({})", pin.lat, pin.lng, pin.address);

    if args.duplicate {
        backends.listings.insert_document(
            "listado-existente",
            json!({
                "tipo": operation.label(),
                "titulo": "Listing already on this pin",
                "userId": "someone-else",
                "lat": pin.lat,
                "lng": pin.lng,
            }),
        );
        println!("- Seeded an existing listing at {}, {}", pin.lat, pin.lng);
    }

    let mut state = WizardState::new(operation);
    for action in wizard_script(&args, category, pin) {
        state = reduce(&state, action).state;
        if let Some(notice) = &state.notice {
            println!("  Step {} blocked: {}", state.step.number(), notice.message());
            return Ok(());
        }
    }
    println!(
        "- Wizard ready on step {} with {} photo(s)",
        state.step.number(),
        state.draft.gallery.len()
    );

    let state = api.service().submit_wizard(&owner, &state).await;
    match (&state.phase, &state.notice) {
        (WizardPhase::Published(id), _) => println!("  Published listing {}", id.as_str()),
        (_, Some(notice)) => {
            println!("  Submission rejected: {}", notice.message());
            println!(
                "  Draft kept on step {} titled {:?}",
                state.step.number(),
                state.draft.title
            );
        }
        (phase, None) => println!("  Wizard ended in {phase:?}"),
    }

    println!("\nUploaded objects");
    for (path, photo) in backends.storage.uploads() {
        println!("  - {path} <- {}", photo.as_str());
    }

    let mut feed = ListingFeed::new(match operation {
        OperationType::Sale => FeedFilter::Buy,
        OperationType::Rental => FeedFilter::Rent,
    });
    feed.sync(&mut backends.listings.subscribe());
    println!("\nFeed ({} visible of {})", feed.visible().len(), feed.len());
    for listing in feed.visible() {
        let card = ListingCard::from_listing(listing, Some(&owner));
        println!(
            "  - {} | {} | {} | owned: {}",
            card.title, card.price, card.address, card.owned
        );
        println!("    map: {}", map_link(listing).uri);
        if !card.owned {
            println!(
                "    contact: {}",
                contact_link(&config.listings.contact_phone, listing).uri
            );
        }
    }

    Ok(())
}
