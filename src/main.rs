// ============================================================================
// PocketBot - Tableau de bord de marché synthétique
// ============================================================================
// Programme TUI : flux de ticks simulés, indicateurs RSI / MACD, et analyse
// du marché par un modèle génératif (avec signal local de repli)
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : render → input → update, ticks générés par la session
// 3. Async dans sync : worker thread avec son propre runtime tokio
// 4. Channels mpsc : commandes vers le worker, résultats vers la boucle
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use pocketbot::api::{AnalysisService, Credential, GeminiClient};
use pocketbot::app::{AnalysisJob, App, PredictionJob};
use pocketbot::config::Settings;
use pocketbot::error::AnalysisError;
use pocketbot::market::MarketSession;
use pocketbot::models::{AnalysisOutcome, PredictionOutcome};
use pocketbot::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand / AppResult : messages échangés avec le worker thread
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Analyser la série courante
    Analyze(AnalysisJob),

    /// Projeter le prix à une heure cible
    Predict(PredictionJob),
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    Analysis {
        session_id: u64,
        outcome: Result<AnalysisOutcome, AnalysisError>,
    },
    Prediction {
        session_id: u64,
        outcome: Result<PredictionOutcome, AnalysisError>,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier, avec rotation quotidienne.
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/pocketbot/logs
/// - macOS : ~/Library/Application Support/pocketbot/logs
/// - Windows : C:\Users\<user>\AppData\Local\pocketbot\logs
/// - ./logs si le répertoire système est introuvable
fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("pocketbot").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/pocketbot/logs/pocketbot.log.*
/// RUST_LOG=pocketbot=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "pocketbot.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pocketbot=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("PocketBot starting up");

    let settings = Settings::load().context("Configuration invalide")?;
    info!(
        model = %settings.model,
        tick_ms = settings.tick_period.as_millis() as u64,
        seeded = settings.seed.is_some(),
        "Settings loaded"
    );

    if std::env::var(&settings.api_key_var).map(|v| v.trim().is_empty()).unwrap_or(true) {
        warn!(var = %settings.api_key_var, "API key not set, analysis requests will be rejected");
    }

    let client = GeminiClient::new(&settings)?;
    let service = AnalysisService::new(client, Credential::Env(settings.api_key_var.clone()));

    // Session de marché : graine fixe si configurée
    let session = match settings.seed {
        Some(seed) => MarketSession::with_seed(settings.tick_period, seed),
        None => MarketSession::new(settings.tick_period),
    };

    let mut app = App::with_session(session);
    app.select_highlighted(Instant::now(), Utc::now());

    // CONCEPT RUST : Arc<Mutex<>> pour partage entre threads
    let app = Arc::new(Mutex::new(app));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(
        command_rx,
        result_tx,
        app.clone(),
        service,
        settings.analysis_min_delay,
    )?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Verrouille l'état partagé
///
/// Un panic dans un autre thread ne doit pas bloquer l'affichage :
/// on récupère l'état même si le mutex est empoisonné.
fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Thread + runtime tokio dédié
// - block_on() bloque le worker, pas l'UI : les ticks continuent
// - Une commande dont la session a été remplacée avant son traitement
//   est abandonnée sans appel réseau
// ============================================================================

fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
    service: AnalysisService<GeminiClient>,
    min_delay: Duration,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    std::thread::Builder::new()
        .name("analysis-worker".to_string())
        .spawn(move || {
            while let Ok(command) = command_rx.recv() {
                info!(?command, "Worker received command");

                let session_id = match &command {
                    AppCommand::Analyze(job) => job.session_id,
                    AppCommand::Predict(job) => job.session_id,
                };
                if lock_app(&app).session.session_id() != session_id {
                    debug!(session_id, "Session superseded, skipping command");
                    continue;
                }

                let result = match command {
                    AppCommand::Analyze(job) => {
                        // CONCEPT : tokio::join!
                        // - L'état "analyse en cours" reste affiché au moins min_delay
                        let outcome = runtime.block_on(async {
                            let (outcome, _) = tokio::join!(
                                service.analyze(&job.request),
                                tokio::time::sleep(min_delay)
                            );
                            outcome
                        });
                        AppResult::Analysis {
                            session_id: job.session_id,
                            outcome,
                        }
                    }
                    AppCommand::Predict(job) => {
                        let outcome = runtime.block_on(service.predict_price_at_time(&job.request));
                        AppResult::Prediction {
                            session_id: job.session_id,
                            outcome,
                        }
                    }
                };

                if result_tx.send(result).is_err() {
                    debug!("Result channel closed, worker stopping");
                    break;
                }
            }
            info!("Worker thread exiting");
        })
        .context("Échec du lancement du worker thread")?;

    Ok(())
}

// ============================================================================
// Event Loop
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    loop {
        if !lock_app(&app).is_running() {
            break;
        }

        // ========================================
        // 0. RÉSULTATS : Traite les résultats du worker
        // ========================================
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(&mut lock_app(&app), result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        // ========================================
        // 1. RENDER : Dessine l'interface
        // ========================================
        terminal.draw(|frame| {
            let app_lock = lock_app(&app);
            render(frame, &app_lock);
        })?;

        // ========================================
        // 2. INPUT : Traite les événements
        // ========================================
        match events.next() {
            Ok(event) => handle_event(&mut lock_app(&app), event, &command_tx),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        // ========================================
        // 3. UPDATE : Génère un tick si dû
        // ========================================
        if let Some(point) = lock_app(&app).tick(Instant::now(), Utc::now()) {
            debug!(price = point.price, "Tick");
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::Analysis { session_id, outcome } => match outcome {
            Ok(outcome) => {
                app.apply_analysis(session_id, outcome);
            }
            Err(e) => {
                warn!(error = %e, "Analysis rejected");
                app.analysis_failed(session_id, e.to_string());
            }
        },
        AppResult::Prediction { session_id, outcome } => match outcome {
            Ok(outcome) => {
                app.apply_prediction(session_id, outcome);
            }
            Err(e) => {
                warn!(error = %e, "Prediction rejected");
                app.prediction_failed(session_id, e.to_string());
            }
        },
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Le mode saisie capture les touches avant les raccourcis
fn handle_event(app: &mut App, event: pocketbot::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use pocketbot::ui::events::{
        get_char_from_event, is_analyze_event, is_backspace_event, is_down_event, is_enter_event,
        is_escape_event, is_next_category_event, is_next_timeframe_event, is_predict_event,
        is_previous_timeframe_event, is_quit_event, is_time_char_event, is_up_event, Event,
    };

    match event {
        // ========================================
        // Mode saisie : heure cible de la prévision
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.is_in_input_mode() => {
            debug!("User cancelled prediction input");
            app.cancel_input();
        }

        Event::Key(_) if is_enter_event(&event) && app.is_in_input_mode() => {
            let target = app.submit_input();
            match app.begin_prediction(&target) {
                Ok(job) => {
                    info!(target = %target, "User requested prediction");
                    if command_tx.send(AppCommand::Predict(job)).is_err() {
                        app.prediction_failed(app.session.session_id(), "Worker indisponible".to_string());
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Invalid prediction target");
                    app.set_status(e.to_string());
                }
            }
        }

        Event::Key(_) if is_backspace_event(&event) && app.is_in_input_mode() => {
            app.backspace();
        }

        Event::Key(_) if is_time_char_event(&event) && app.is_in_input_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        Event::Key(_) if app.is_in_input_mode() => {}

        // ========================================
        // Dashboard
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
        }

        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
        }

        Event::Key(_) if is_next_category_event(&event) => {
            app.cancel_quit();
            app.next_category();
            debug!(category = %app.category.label(), "User changed category");
        }

        Event::Key(_) if is_enter_event(&event) => {
            app.cancel_quit();
            app.select_highlighted(Instant::now(), Utc::now());
        }

        Event::Key(_) if is_next_timeframe_event(&event) => {
            app.cancel_quit();
            app.next_timeframe();
            info!(timeframe = %app.timeframe.label(), "User changed timeframe");
        }

        Event::Key(_) if is_previous_timeframe_event(&event) => {
            app.cancel_quit();
            app.previous_timeframe();
            info!(timeframe = %app.timeframe.label(), "User changed timeframe");
        }

        Event::Key(_) if is_analyze_event(&event) => {
            app.cancel_quit();
            match app.begin_analysis() {
                Some(job) => {
                    info!(asset = %job.request.asset, timeframe = %job.request.timeframe.label(), "User requested analysis");
                    let session_id = job.session_id;
                    if command_tx.send(AppCommand::Analyze(job)).is_err() {
                        app.analysis_failed(session_id, "Worker indisponible".to_string());
                    }
                }
                None => debug!("Analysis not started"),
            }
        }

        Event::Key(_) if is_predict_event(&event) => {
            app.cancel_quit();
            app.start_prediction_input();
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }

        Event::Tick => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Échec de la création du terminal")
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
