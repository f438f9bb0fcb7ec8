// src/main.rs — Activity Board (Rust + Yew + WASM)
//
// Client for the school activities API:
// - lists activities with availability and a roster of participant badges
// - signup form posting to /activities/{name}/signup
// - per-badge removal (confirm dialog) deleting from /activities/{name}/participants

use std::collections::BTreeMap;

use gloo::console::error;
use gloo::dialogs::confirm;
use gloo::timers::callback::Timeout;
use gloo_net::http::{Request, Response};
use serde::Deserialize;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Prefix for all API calls; empty means the origin serving the app.
const API_BASE: &str = "";

/// How long a status message stays on screen.
const MESSAGE_HIDE_MS: u32 = 5_000;

const LOAD_FAILED: &str = "Failed to load activities. Please try again later.";
const SIGNUP_REJECTED: &str = "An error occurred";
const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
const REMOVE_REJECTED: &str = "Failed to remove participant";
const REMOVE_FAILED: &str = "Failed to remove participant. Please try again.";

// ---------- data model ----------

/// The list endpoint returns a JSON object keyed by activity name; a BTreeMap
/// keeps the card order deterministic.
type Activities = BTreeMap<String, Activity>;

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Activity {
    description: String,
    schedule: String,
    max_participants: u32,
    #[serde(default)]
    participants: Vec<String>,
}

impl Activity {
    /// Capacity minus roster size. Signed: the client shows whatever the
    /// server state implies, even if the roster is oversubscribed.
    fn spots_left(&self) -> i64 {
        i64::from(self.max_participants) - self.participants.len() as i64
    }
}

fn availability_label(activity: &Activity) -> String {
    format!("{} spots left", activity.spots_left())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    fn css_class(self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StatusMessage {
    text: String,
    kind: MessageKind,
}

/// Next (snapshot, failed) pair after a list fetch resolves. A failed fetch
/// keeps the last snapshot so the signup options stay usable while the list
/// area shows the failure text.
fn apply_fetch(
    current: Option<Activities>,
    result: Result<Activities, ApiError>,
) -> (Option<Activities>, bool) {
    match result {
        Ok(snapshot) => (Some(snapshot), false),
        Err(_) => (current, true),
    }
}

/// Hands out generation numbers for list fetches so a response that was
/// overtaken by a newer request can be recognized and dropped.
#[derive(Debug, Default)]
struct FetchGen(u64);

impl FetchGen {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    fn is_current(&self, gen: u64) -> bool {
        self.0 == gen
    }
}

// ---------- API client ----------

#[derive(Debug, Clone, PartialEq)]
enum ApiError {
    /// No usable HTTP response (network down, CORS, body not parseable).
    Transport(String),
    /// The server answered with a non-2xx status.
    Rejected { status: u16, detail: Option<String> },
}

impl ApiError {
    /// Text to show the user: server-provided detail when present, otherwise
    /// the action's fallback.
    fn user_text(&self, rejected_fallback: &str, transport_fallback: &str) -> String {
        match self {
            ApiError::Transport(_) => transport_fallback.to_string(),
            ApiError::Rejected { detail: Some(d), .. } => d.clone(),
            ApiError::Rejected { .. } => rejected_fallback.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "transport error: {e}"),
            ApiError::Rejected { status, detail: Some(d) } => write!(f, "HTTP {status}: {d}"),
            ApiError::Rejected { status, detail: None } => write!(f, "HTTP {status}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignupOk {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Rejection {
    #[serde(default)]
    detail: Option<String>,
}

fn activities_url(base: &str) -> String {
    format!("{base}/activities")
}

fn signup_url(base: &str, activity: &str, email: &str) -> String {
    format!(
        "{base}/activities/{}/signup?email={}",
        urlencoding::encode(activity),
        urlencoding::encode(email)
    )
}

fn unregister_url(base: &str, activity: &str, email: &str) -> String {
    format!(
        "{base}/activities/{}/participants?email={}",
        urlencoding::encode(activity),
        urlencoding::encode(email)
    )
}

fn rejection_detail(body: &str) -> Option<String> {
    serde_json::from_str::<Rejection>(body).ok().and_then(|r| r.detail)
}

async fn rejected(resp: Response) -> ApiError {
    let status = resp.status();
    let detail = rejection_detail(&resp.text().await.unwrap_or_default());
    ApiError::Rejected { status, detail }
}

async fn fetch_activities(base: &str) -> Result<Activities, ApiError> {
    let resp = Request::get(&activities_url(base))
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejected(resp).await);
    }
    resp.json::<Activities>()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

async fn signup(base: &str, activity: &str, email: &str) -> Result<String, ApiError> {
    let resp = Request::post(&signup_url(base, activity, email))
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejected(resp).await);
    }
    resp.json::<SignupOk>()
        .await
        .map(|ok| ok.message)
        .map_err(|e| ApiError::Transport(e.to_string()))
}

async fn unregister(base: &str, activity: &str, email: &str) -> Result<(), ApiError> {
    let resp = Request::delete(&unregister_url(base, activity, email))
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejected(resp).await);
    }
    Ok(())
}

// ---------- view ----------

fn activity_card(name: &str, activity: &Activity, on_remove: &Callback<(String, String)>) -> Html {
    let participants = if activity.participants.is_empty() {
        html! { <p class="info">{ "No participants yet" }</p> }
    } else {
        html! {
          <ul class="participants-list">
            { for activity.participants.iter().map(|participant| {
                let onclick = {
                    let on_remove = on_remove.clone();
                    let name = name.to_string();
                    let participant = participant.clone();
                    Callback::from(move |_: MouseEvent| {
                        on_remove.emit((name.clone(), participant.clone()));
                    })
                };
                html! {
                  <li class="participant-badge" key={participant.clone()}>
                    { participant.clone() }
                    <button class="participant-delete" title="Remove participant" {onclick}>
                      { "\u{d7}" }
                    </button>
                  </li>
                }
            }) }
          </ul>
        }
    };

    html! {
      <div class="activity-card" key={name.to_string()}>
        <h4>{ name.to_string() }</h4>
        <p>{ activity.description.clone() }</p>
        <p><strong>{ "Schedule: " }</strong>{ activity.schedule.clone() }</p>
        <p><strong>{ "Availability: " }</strong>{ availability_label(activity) }</p>
        <div class="participants-section">
          <h5>{ "Participants" }</h5>
          { participants }
        </div>
      </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    // Latest server snapshot; every fetch replaces it wholesale.
    let activities = use_state(|| None::<Activities>);
    let load_failed = use_state(|| false);
    let message = use_state(|| None::<StatusMessage>);
    let email = use_state(String::new);
    let selected = use_state(String::new);

    let fetch_gen = use_mut_ref(FetchGen::default);
    let hide_timer = use_mut_ref(|| None::<Timeout>);

    let show_message = {
        let message = message.clone();
        let hide_timer = hide_timer.clone();
        move |text: String, kind: MessageKind| {
            message.set(Some(StatusMessage { text, kind }));
            let message = message.clone();
            // Replacing the handle drops (cancels) the previous timer, so a
            // newer message gets the full five seconds.
            *hide_timer.borrow_mut() = Some(Timeout::new(MESSAGE_HIDE_MS, move || {
                message.set(None);
            }));
        }
    };

    let load = {
        let activities = activities.clone();
        let load_failed = load_failed.clone();
        let fetch_gen = fetch_gen.clone();
        move || {
            let activities = activities.clone();
            let load_failed = load_failed.clone();
            let fetch_gen = fetch_gen.clone();
            let gen = fetch_gen.borrow_mut().next();
            spawn_local(async move {
                let result = fetch_activities(API_BASE).await;
                if !fetch_gen.borrow().is_current(gen) {
                    // A newer refresh was issued while this one was in flight.
                    return;
                }
                if let Err(err) = &result {
                    error!(format!("Error fetching activities: {err}"));
                }
                let (snapshot, failed) = apply_fetch((*activities).clone(), result);
                activities.set(snapshot);
                load_failed.set(failed);
            });
        }
    };

    // Initial load
    {
        let load = load.clone();
        use_effect_with((), move |_| {
            load();
            || ()
        });
    }

    let onsubmit = {
        let email = email.clone();
        let selected = selected.clone();
        let show_message = show_message.clone();
        let load = load.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let activity = (*selected).clone();
            let address = (*email).clone();
            let email = email.clone();
            let selected = selected.clone();
            let show_message = show_message.clone();
            let load = load.clone();
            spawn_local(async move {
                match signup(API_BASE, &activity, &address).await {
                    Ok(text) => {
                        show_message(text, MessageKind::Success);
                        email.set(String::new());
                        selected.set(String::new());
                        load();
                    }
                    Err(err) => {
                        if matches!(err, ApiError::Transport(_)) {
                            error!(format!("Error signing up: {err}"));
                        }
                        show_message(
                            err.user_text(SIGNUP_REJECTED, SIGNUP_FAILED),
                            MessageKind::Error,
                        );
                    }
                }
            });
        })
    };

    let on_remove = {
        let activities = activities.clone();
        let show_message = show_message.clone();
        let load = load.clone();
        Callback::from(move |(activity, address): (String, String)| {
            if !confirm(&format!("Remove {address} from {activity}?")) {
                return;
            }
            let activities = activities.clone();
            let show_message = show_message.clone();
            let load = load.clone();
            spawn_local(async move {
                match unregister(API_BASE, &activity, &address).await {
                    Ok(()) => {
                        // Drop the badge right away; the follow-up fetch
                        // reconciles availability counts with the server.
                        if let Some(mut snapshot) = (*activities).clone() {
                            if let Some(entry) = snapshot.get_mut(&activity) {
                                entry.participants.retain(|p| p != &address);
                            }
                            activities.set(Some(snapshot));
                        }
                        load();
                    }
                    Err(err) => {
                        if matches!(err, ApiError::Transport(_)) {
                            error!(format!("Error removing participant: {err}"));
                        }
                        show_message(
                            err.user_text(REMOVE_REJECTED, REMOVE_FAILED),
                            MessageKind::Error,
                        );
                    }
                }
            });
        })
    };

    let on_email_input = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            email.set(input.value());
        })
    };

    let on_activity_change = {
        let selected = selected.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            selected.set(select.value());
        })
    };

    let board = if *load_failed {
        html! { <p class="info">{ LOAD_FAILED }</p> }
    } else if let Some(snapshot) = &*activities {
        html! {
          { for snapshot.iter().map(|(name, activity)| activity_card(name, activity, &on_remove)) }
        }
    } else {
        html! { <p class="info">{ "Loading activities..." }</p> }
    };

    let options: Vec<String> = match &*activities {
        Some(snapshot) => snapshot.keys().cloned().collect(),
        None => Vec::new(),
    };

    let message_block = match &*message {
        Some(m) => html! { <div id="message" class={m.kind.css_class()}>{ m.text.clone() }</div> },
        None => html! {},
    };

    html! {
      <>
        <header>
          <h1>{ "Mergington High School" }</h1>
          <p>{ "Extracurricular Activities" }</p>
        </header>

        <main>
          <section id="activities-container">
            <h3>{ "Activities" }</h3>
            <div id="activities-list">{ board }</div>
          </section>

          <section id="signup-container">
            <h3>{ "Sign Up for an Activity" }</h3>
            <form id="signup-form" onsubmit={onsubmit}>
              <label for="email">{ "Student Email:" }</label>
              <input
                id="email"
                type="email"
                required={true}
                placeholder="your-email@mergington.edu"
                value={(*email).clone()}
                oninput={on_email_input}
              />
              <label for="activity">{ "Select Activity:" }</label>
              <select id="activity" required={true} onchange={on_activity_change}>
                <option value="" selected={selected.is_empty()}>
                  { "-- Select an activity --" }
                </option>
                { for options.iter().map(|name| html! {
                    <option value={name.clone()} selected={*name == *selected}>
                      { name.clone() }
                    </option>
                }) }
              </select>
              <button type="submit">{ "Sign Up" }</button>
            </form>
            { message_block }
          </section>
        </main>
      </>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(max: u32, participants: &[&str]) -> Activity {
        Activity {
            description: "desc".into(),
            schedule: "Mondays".into(),
            max_participants: max,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn spots_left_is_capacity_minus_roster() {
        assert_eq!(activity(12, &["a@x.io", "b@x.io"]).spots_left(), 10);
        assert_eq!(activity(0, &[]).spots_left(), 0);
    }

    #[test]
    fn spots_left_goes_negative_when_oversubscribed() {
        assert_eq!(activity(1, &["a@x.io", "b@x.io"]).spots_left(), -1);
    }

    #[test]
    fn availability_label_counts_spots() {
        assert_eq!(availability_label(&activity(20, &["a@x.io"])), "19 spots left");
    }

    #[test]
    fn activities_decode_from_list_response() {
        let body = r#"{
            "Chess Club": {
                "description": "Learn strategies and compete in tournaments",
                "schedule": "Fridays, 3:30 PM - 5:00 PM",
                "max_participants": 12,
                "participants": ["michael@mergington.edu", "daniel@mergington.edu"]
            },
            "Art Club": {
                "description": "Painting and drawing",
                "schedule": "Tuesdays, 3:30 PM - 5:00 PM",
                "max_participants": 15
            }
        }"#;
        let snapshot: Activities = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.len(), 2);

        let chess = &snapshot["Chess Club"];
        assert_eq!(
            chess.participants,
            vec!["michael@mergington.edu", "daniel@mergington.edu"]
        );
        assert_eq!(chess.spots_left(), 10);

        // a missing participants field decodes to an empty roster
        assert!(snapshot["Art Club"].participants.is_empty());
    }

    #[test]
    fn urls_percent_encode_path_and_query() {
        assert_eq!(
            signup_url("", "Chess Club", "new+student@mergington.edu"),
            "/activities/Chess%20Club/signup?email=new%2Bstudent%40mergington.edu"
        );
        assert_eq!(
            unregister_url("/api", "Gym Class", "a/b@x.io"),
            "/api/activities/Gym%20Class/participants?email=a%2Fb%40x.io"
        );
        assert_eq!(activities_url(""), "/activities");
    }

    #[test]
    fn rejection_detail_prefers_server_text() {
        assert_eq!(
            rejection_detail(r#"{"detail":"Activity full"}"#),
            Some("Activity full".to_string())
        );
        assert_eq!(rejection_detail(r#"{"message":"ok"}"#), None);
        assert_eq!(rejection_detail("not json"), None);
    }

    #[test]
    fn rejected_error_shows_detail_or_fallback() {
        let with_detail = ApiError::Rejected {
            status: 400,
            detail: Some("Activity full".to_string()),
        };
        assert_eq!(with_detail.user_text(SIGNUP_REJECTED, SIGNUP_FAILED), "Activity full");

        let without = ApiError::Rejected { status: 500, detail: None };
        assert_eq!(
            without.user_text(SIGNUP_REJECTED, SIGNUP_FAILED),
            "An error occurred"
        );
    }

    #[test]
    fn transport_error_uses_generic_text() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(
            err.user_text(REMOVE_REJECTED, REMOVE_FAILED),
            "Failed to remove participant. Please try again."
        );
    }

    #[test]
    fn empty_roster_renders_placeholder() {
        let on_remove = Callback::from(|_: (String, String)| ());

        let card = format!("{:?}", activity_card("Art Club", &activity(15, &[]), &on_remove));
        assert!(card.contains("No participants yet"));
        assert!(!card.contains("participants-list"));

        let card = format!(
            "{:?}",
            activity_card("Art Club", &activity(15, &["a@x.io"]), &on_remove)
        );
        assert!(card.contains("participants-list"));
        assert!(!card.contains("No participants yet"));
    }

    #[test]
    fn failed_refresh_keeps_last_snapshot() {
        let current = Some(BTreeMap::from([(
            "Chess Club".to_string(),
            activity(12, &["a@x.io"]),
        )]));

        let (snapshot, failed) =
            apply_fetch(current.clone(), Err(ApiError::Transport("offline".to_string())));
        assert!(failed);
        assert_eq!(snapshot, current);

        let fresh: Activities = BTreeMap::new();
        let (snapshot, failed) = apply_fetch(current, Ok(fresh.clone()));
        assert!(!failed);
        assert_eq!(snapshot, Some(fresh));
    }

    #[test]
    fn stale_fetch_generations_are_dropped() {
        let mut gens = FetchGen::default();
        let first = gens.next();
        let second = gens.next();
        assert!(!gens.is_current(first));
        assert!(gens.is_current(second));
    }

    #[test]
    fn message_kind_maps_to_css_class() {
        assert_eq!(MessageKind::Success.css_class(), "success");
        assert_eq!(MessageKind::Error.css_class(), "error");
    }
}
