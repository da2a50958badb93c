// ============================================================================
// LazyChart - Dashboard d'analyse technique dans le terminal
// ============================================================================
// Programme TUI : watchlist de symboles, vue chart avec chandelles,
// indicateurs, figures détectées et outils de dessin à la souris
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal (clavier + souris)
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : tokio::runtime::Runtime pour les appels au backend
// 4. Worker thread : fetch en arrière-plan sans bloquer l'UI
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use lazychart::api::analysis::{fetch_report, AnalysisReport};
use lazychart::app::App;
use lazychart::chart::normalize_candles;
use lazychart::models::candle::CandleSeries;
use lazychart::models::drawing::DrawingTool;
use lazychart::models::granularity::Granularity;
use lazychart::models::watchlist::WatchedSymbol;
use lazychart::ui::{candlesticks, events::EventHandler, render};

// ============================================================================
// AppCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker thread exécute les tâches async (fetch backend)
// - Communication via mpsc channels (multi-producer, single-consumer)
// ============================================================================

/// Commandes envoyées au worker thread pour exécuter des tâches async
#[derive(Debug, Clone)]
enum AppCommand {
    /// Recharger le rapport d'un symbole (chandelles + verdict d'analyse)
    ///
    /// Envoyé à l'ouverture de la vue chart et à chaque changement de
    /// granularité. `index` est la position du symbole dans la watchlist.
    ReloadReport {
        symbol: String,
        granularity: Granularity,
        index: usize,
    },

    /// Ajouter un nouveau symbole à la watchlist
    AddSymbol { symbol: String },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Rapport rechargé avec succès
    ReportLoaded { index: usize, report: AnalysisReport },

    /// Nouveau symbole ajouté avec succès
    SymbolAdded {
        symbol: String,
        report: AnalysisReport,
    },

    /// Erreur lors du chargement
    LoadError { symbol: String, error: String },

    /// Erreur lors de l'ajout d'un symbole
    AddError { symbol: String, error: String },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place
// - Tracing : framework moderne de logging structuré
// - Rotation quotidienne automatique des logs
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux/WSL : ~/.local/share/lazychart/logs/lazychart.log
/// - macOS : ~/Library/Application Support/lazychart/logs/lazychart.log
/// - Windows : C:\Users\<user>\AppData\Local\lazychart\logs\lazychart.log
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/lazychart/logs/lazychart.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=lazychart=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("lazychart").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("./logs"));

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : lazychart.log.2024-01-15, etc.
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazychart.log");

    // Configure le subscriber (receveur de logs)
    // CONCEPT : Builder pattern avec layers
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: lazychart::chart)
                .with_thread_ids(true) // Inclut l'ID du thread (utile pour async)
                .with_line_number(true),
        )
        .with(
            // Filtre les logs par niveau
            // Par défaut : debug pour lazychart, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazychart=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging FIRST
    // - Si init échoue, on affiche l'erreur et continue quand même
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    println!("LazyChart starting up");
    info!("LazyChart starting up");

    // Charge les rapports initiaux de la watchlist (appels API async)
    info!("Loading watchlist data");
    println!("📊 Chargement des données...\n");

    let runtime = tokio::runtime::Runtime::new()?;
    let watchlist = runtime.block_on(load_watchlist_data())?;

    info!("Watchlist data loaded successfully");
    println!("✅ Données chargées !\n");

    // Setup du terminal en mode TUI
    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // Crée l'état de l'application avec les données chargées
    // CONCEPT RUST : Arc<Mutex<>> pour partage entre threads
    // - Arc : Reference counting pour ownership partagé
    // - Mutex : Protection contre les data races
    // - Permet au worker thread et à l'UI d'accéder à App
    let app = Arc::new(Mutex::new(App::with_watchlist(watchlist)));

    // Crée les channels pour communication avec le worker
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    // Lance le worker thread en arrière-plan
    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, app.clone());

    // Crée le gestionnaire d'événements
    let events = EventHandler::new();

    // Exécute l'event loop
    info!("Starting event loop");
    let result = run(&mut terminal, app.clone(), &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Chargement initial
// ============================================================================

/// Charge les rapports initiaux de la watchlist depuis le backend
///
/// Un échec sur un symbole n'est pas fatal : la ligne reste sans données et
/// affiche "Chargement..." jusqu'au prochain rechargement.
async fn load_watchlist_data() -> Result<Vec<WatchedSymbol>> {
    let symbols = [
        ("AAPL", "Apple Inc."),
        ("TSLA", "Tesla"),
        ("BTC-USD", "Bitcoin USD"),
    ];

    let mut watchlist = Vec::new();

    for (i, &(symbol, name)) in symbols.iter().enumerate() {
        debug!(symbol = %symbol, progress = i + 1, total = symbols.len(), "Fetching initial report");
        println!("  [{}/{}] Chargement de {}...", i + 1, symbols.len(), symbol);

        let mut item = WatchedSymbol::new(symbol.to_string(), name.to_string());
        match fetch_report(symbol, Granularity::default()).await {
            Ok(report) => {
                info!(symbol = %symbol, candles = report.candles.len(), "Initial report fetched");
                let mut series = CandleSeries::new(symbol.to_string(), report.granularity);
                series.candles = normalize_candles(&report.candles, report.granularity);
                item.series = Some(series);
                item.analysis = Some(report.analysis);
                println!("    ✓ OK");
            }
            Err(e) => {
                error!(symbol = %symbol, error = ?e, "Failed to fetch initial report");
            }
        }
        watchlist.push(item);

        // Petit délai entre les requêtes (rate limiting)
        if i < symbols.len() - 1 {
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        }
    }

    Ok(watchlist)
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Thread séparé qui traite les commandes async
// - Reçoit des AppCommand via un channel (command_rx)
// - Envoie des AppResult via un autre channel (result_tx)
// - Permet de faire des appels backend sans bloquer l'UI
// ============================================================================

/// Worker thread qui exécute les tâches async en arrière-plan
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        // Runtime tokio propre à ce thread
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

        loop {
            match command_rx.recv() {
                Ok(command) => {
                    info!(?command, "Worker received command");

                    match command {
                        AppCommand::ReloadReport {
                            symbol,
                            granularity,
                            index,
                        } => {
                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.start_loading(Some(format!(
                                    "Chargement {} en {}...",
                                    symbol,
                                    granularity.label()
                                )));
                            }

                            // block_on() bloque le thread worker, pas l'UI
                            let result =
                                runtime.block_on(async { fetch_report(&symbol, granularity).await });

                            match result {
                                Ok(report) => {
                                    info!(symbol = %symbol, granularity = %granularity.label(), candles = report.candles.len(), "Report loaded successfully");
                                    let _ = result_tx.send(AppResult::ReportLoaded { index, report });
                                }
                                Err(e) => {
                                    error!(symbol = %symbol, error = ?e, "Failed to load report");
                                    let _ = result_tx.send(AppResult::LoadError {
                                        symbol: symbol.clone(),
                                        error: e.to_string(),
                                    });
                                }
                            }

                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.stop_loading();
                            }
                        }

                        AppCommand::AddSymbol { symbol } => {
                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.start_loading(Some(format!("Ajout de {}...", symbol)));
                            }

                            let result = runtime.block_on(async {
                                fetch_report(&symbol, Granularity::default()).await
                            });

                            match result {
                                Ok(report) => {
                                    info!(symbol = %symbol, candles = report.candles.len(), "Symbol added successfully");
                                    let _ = result_tx.send(AppResult::SymbolAdded {
                                        symbol: symbol.clone(),
                                        report,
                                    });
                                }
                                Err(e) => {
                                    error!(symbol = %symbol, error = ?e, "Failed to add symbol");
                                    let _ = result_tx.send(AppResult::AddError {
                                        symbol: symbol.clone(),
                                        error: e.to_string(),
                                    });
                                }
                            }

                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.stop_loading();
                            }
                        }
                    }
                }
                Err(_) => {
                    // Channel fermé, on quitte
                    info!("Worker thread exiting (channel closed)");
                    break;
                }
            }
        }
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Game Loop / Event Loop Pattern
// - Loop infinie : while app.is_running()
// - À chaque itération :
//   1. Traiter les résultats du worker
//   2. Reconstruire le chart si nécessaire
//   3. Dessiner l'interface (render)
//   4. Traiter les événements (input)
// ============================================================================

/// Exécute la boucle principale de l'application
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        {
            let app_lock = app.lock().unwrap();
            if !app_lock.is_running() {
                break;
            }
        }

        // ========================================
        // 0. RÉSULTATS : Traite les réponses du worker
        // ========================================
        // CONCEPT : Non-blocking receive avec try_recv
        match result_rx.try_recv() {
            Ok(result) => match result {
                AppResult::ReportLoaded { index, report } => {
                    let mut app_lock = app.lock().unwrap();
                    info!(symbol = %report.symbol, candles = report.candles.len(), "Applying loaded report");
                    app_lock.apply_report(index, report);
                }
                AppResult::SymbolAdded { symbol, report } => {
                    let mut app_lock = app.lock().unwrap();
                    info!(symbol = %symbol, candles = report.candles.len(), "Adding symbol to watchlist");
                    app_lock
                        .watchlist
                        .push(WatchedSymbol::new(symbol.clone(), symbol));
                    let index = app_lock.watchlist.len() - 1;
                    app_lock.apply_report(index, report);
                }
                AppResult::LoadError { symbol, error } => {
                    error!(symbol = %symbol, error = %error, "Failed to load report");
                }
                AppResult::AddError { symbol, error } => {
                    error!(symbol = %symbol, error = %error, "Failed to add symbol");
                }
            },
            Err(mpsc::TryRecvError::Empty) => {
                // Pas de résultat, c'est normal
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Worker thread disconnected!");
            }
        }

        // ========================================
        // 1. REBUILD : Reconstruit le chart si une dépendance a changé
        // ========================================
        // Une seule reconstruction par tour de boucle : données, granularité,
        // toggles, dessins committés et dimensions du viewport passent tous
        // par le même chemin (démontage complet puis construction neuve).
        {
            let mut app_lock = app.lock().unwrap();
            let app_ref = &mut *app_lock;
            if app_ref.is_on_chart() && app_ref.chart.needs_rebuild() {
                app_ref.chart.rebuild(
                    &app_ref.active_symbol,
                    app_ref.granularity,
                    &app_ref.candles,
                    app_ref.analysis.as_ref(),
                );
            }
        }

        // ========================================
        // 2. RENDER : Dessine l'interface
        // ========================================
        {
            let app_clone = app.clone();
            terminal.draw(|frame| {
                let mut app_lock = app_clone.lock().unwrap();
                render(frame, &mut app_lock);
            })?;
        }

        // ========================================
        // 3. INPUT : Traite les événements
        // ========================================
        if let Ok(event) = events.next() {
            let mut app_lock = app.lock().unwrap();
            handle_event(&mut app_lock, event, &command_tx);
        }

        // ========================================
        // 4. UPDATE : Met à jour l'état
        // ========================================
        {
            let mut app_lock = app.lock().unwrap();
            app_lock.tick();
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT : Event Handler Pattern
// - Sépare la logique de gestion des événements
// - Modifie l'état de app selon l'événement
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Guard clauses (if) pour filtrer les événements selon l'écran actif
/// - command_tx : pour envoyer des commandes au worker thread
fn handle_event(
    app: &mut App,
    event: lazychart::ui::events::Event,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    use lazychart::ui::events::{
        get_char_from_event, is_add_event, is_backspace_event, is_delete_event, is_down_event,
        is_enter_event, is_escape_event, is_left_click, is_left_event, is_mouse_move,
        is_quit_event, is_right_event, is_ticker_char_event, is_up_event, mouse_position, Event,
    };

    match event {
        // ========================================
        // Souris : outils de dessin sur la vue chart
        // ========================================
        // Le clic et le déplacement sont traduits en couple temps/prix via la
        // zone tracée à la dernière frame. Hors de cette zone (ou si rien
        // n'est tracé), le point est None et le moteur ignore le geste.
        Event::Mouse(_) if app.is_on_chart() => {
            let Some((column, row)) = mouse_position(&event) else {
                return;
            };
            let point = app.chart_area.and_then(|area| {
                app.chart
                    .surface()
                    .and_then(|surface| candlesticks::hit_test(surface, area, column, row))
            });
            if is_left_click(&event) {
                app.chart.handle_chart_click(point);
            } else if is_mouse_move(&event) {
                app.chart.handle_chart_move(point);
            }
        }

        // Touche 'q' : quit confirmation two-step (sauf en mode saisie)
        Event::Key(_) if is_quit_event(&event) && !app.is_in_input_mode() => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // ========================================
        // Dashboard
        // ========================================

        // 'd' : supprimer le symbole sélectionné (two-step)
        Event::Key(_) if is_delete_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            if !app.watchlist.is_empty() {
                if app.is_awaiting_delete_confirmation() {
                    let symbol = app
                        .selected_item()
                        .map(|item| item.symbol.clone())
                        .unwrap_or_default();
                    info!(symbol = %symbol, "User confirmed delete");
                    app.delete_selected();
                } else {
                    info!("User requested delete (awaiting confirmation)");
                    app.request_delete();
                }
            }
        }

        // 'a' : ajouter un symbole
        Event::Key(_) if is_add_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.cancel_delete();
            info!("User requested add symbol");
            app.start_input("Ajouter un symbole : ".to_string());
        }

        // Navigation dans la watchlist
        Event::Key(_) if is_up_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_down();
        }

        // Enter : ouvrir la vue chart sur le symbole sélectionné
        Event::Key(_) if is_enter_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.cancel_delete();
            if app.open_selected_chart() {
                info!(symbol = %app.active_symbol, "User opened chart view");
                let _ = command_tx.send(AppCommand::ReloadReport {
                    symbol: app.active_symbol.clone(),
                    granularity: app.granularity,
                    index: app.selected_index,
                });
            }
        }

        // ========================================
        // Vue chart
        // ========================================

        // ESC : retour au dashboard (le chart est démonté)
        Event::Key(_) if is_escape_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            debug!("User returned to dashboard");
            app.close_chart();
        }

        // Flèche gauche : granularité précédente, rechargement en arrière-plan
        Event::Key(_) if is_left_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.previous_granularity();
            info!(granularity = %app.granularity.label(), "User changed granularity");
            let _ = command_tx.send(AppCommand::ReloadReport {
                symbol: app.active_symbol.clone(),
                granularity: app.granularity,
                index: app.selected_index,
            });
        }

        // Flèche droite : granularité suivante
        Event::Key(_) if is_right_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.next_granularity();
            info!(granularity = %app.granularity.label(), "User changed granularity");
            let _ = command_tx.send(AppCommand::ReloadReport {
                symbol: app.active_symbol.clone(),
                granularity: app.granularity,
                index: app.selected_index,
            });
        }

        // Raccourcis de la vue chart : indicateurs, outils, panneau, plein écran
        Event::Key(_) if app.is_on_chart() => {
            app.cancel_quit();
            let Some(c) = get_char_from_event(&event) else {
                return;
            };
            match c.to_ascii_lowercase() {
                'f' => {
                    debug!("User requested fullscreen toggle");
                    app.chart.viewport.request_fullscreen_toggle();
                }
                'h' => app.chart.select_tool(DrawingTool::HorizontalLine),
                't' => app.chart.select_tool(DrawingTool::TrendLine),
                'c' => {
                    let removed = app.chart.clear_drawings();
                    debug!(removed, "User cleared manual drawings");
                }
                'p' => app.toggle_patterns_panel(),
                other => {
                    // '1'/'2'/'3'/'b'/'r'/'m'/'v' : toggles d'indicateurs
                    let _ = app.toggle_overlay(other);
                }
            }
        }

        // ========================================
        // Input Mode : Saisie d'un symbole
        // ========================================

        // ESC : annuler le mode input
        Event::Key(_) if is_escape_event(&event) && app.is_in_input_mode() => {
            info!("User cancelled input");
            app.cancel_input();
        }

        // Enter : valider et envoyer l'ajout au worker
        Event::Key(_) if is_enter_event(&event) && app.is_in_input_mode() => {
            let symbol = app.submit_input().trim().to_uppercase();
            if !symbol.is_empty() {
                info!(symbol = %symbol, "User submitted symbol for adding");
                let _ = command_tx.send(AppCommand::AddSymbol { symbol });
            } else {
                debug!("Empty symbol, ignoring");
            }
        }

        // Backspace : supprimer le dernier caractère
        Event::Key(_) if is_backspace_event(&event) && app.is_in_input_mode() => {
            app.backspace();
        }

        // Caractères : ajouter au buffer
        Event::Key(_) if is_ticker_char_event(&event) && app.is_in_input_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        // Redimensionnement : le viewport se resynchronise au prochain rendu
        Event::Resize(width, height) => {
            debug!(width, height, "Terminal resized");
        }

        Event::Tick => {
            // Tick régulier : rien à faire pour l'instant
        }

        Event::Key(_) => {
            // Toute autre touche : annule les confirmations si actives
            app.cancel_quit();
            app.cancel_delete();
        }

        _ => {
            // Souris hors vue chart : ignorée
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// CONCEPT RUST : Terminal raw mode
// - Raw mode : on reçoit tous les caractères directement
// - Alternate screen : écran secondaire (ne pollue pas l'historique)
// - Mouse capture : nécessaire aux outils de dessin
//
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture // Souris : clics et déplacements pour le dessin
    )?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
///
/// Appelé dans main() même en cas d'erreur, pour ne pas laisser le terminal
/// en raw mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}
