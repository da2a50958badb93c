// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Composition : App possède le moteur de chart et la watchlist
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Garantit la cohérence de l'état
// ============================================================================

use ratatui::layout::Rect;

use crate::api::analysis::AnalysisReport;
use crate::chart::{normalize_candles, ChartEngine};
use crate::models::analysis::AnalysisSnapshot;
use crate::models::candle::{CandleSeries, RawCandle};
use crate::models::granularity::Granularity;
use crate::models::watchlist::WatchedSymbol;

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Représente les différents écrans de l'application
// - Pattern "State Machine" : un seul écran actif à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : liste des symboles suivis (watchlist)
    Dashboard,

    /// Vue chart : chandelles, indicateurs et figures du symbole actif
    ChartView,

    /// Mode saisie : permet de capturer du texte utilisateur
    /// CONCEPT : Modal input mode (Vim-like)
    /// - Capture les touches pour construire un buffer
    /// - Enter valide, ESC annule
    InputMode,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Liste des symboles suivis (watchlist)
    pub watchlist: Vec<WatchedSymbol>,

    /// Index du symbole sélectionné dans la watchlist
    pub selected_index: usize,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Granularité courante des chandelles (M1 à MN1)
    /// Modifiée avec les flèches gauche/droite sur la vue chart
    pub granularity: Granularity,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// CONCEPT : Two-step quit pour éviter les sorties accidentelles
    pub confirm_quit: bool,

    /// Indique si des données sont en cours de chargement
    pub is_loading: bool,

    /// Message de chargement optionnel
    pub loading_message: Option<String>,

    /// Buffer de saisie pour le mode Input
    pub input_buffer: String,

    /// Prompt affiché en mode Input
    pub input_prompt: String,

    /// Indique si l'utilisateur a demandé une suppression (attend confirmation)
    pub confirm_delete: bool,

    // ========================================================================
    // État de la vue chart
    // ========================================================================
    /// Moteur de chart : surface, overlays, annotations, dessins, viewport
    pub chart: ChartEngine,

    /// Symbole affiché par la vue chart
    pub active_symbol: String,

    /// Lignes brutes du backend pour le symbole actif
    ///
    /// Le moteur normalise à chaque reconstruction : on garde la forme brute
    /// pour que granularité et toggles puissent reconstruire sans refetch.
    pub candles: Vec<RawCandle>,

    /// Verdict d'analyse du symbole actif (figures, niveaux, score)
    pub analysis: Option<AnalysisSnapshot>,

    /// Zone du panneau principal telle que tracée à la dernière frame
    ///
    /// Renseignée par la vue, consommée par le hit-testing souris. None tant
    /// que rien n'est tracé : les clics sont alors ignorés.
    pub chart_area: Option<Rect>,

    /// Affichage du panneau latéral des figures détectées
    pub show_patterns: bool,
}

impl App {
    /// Crée une nouvelle instance de App avec une watchlist vide
    pub fn new() -> Self {
        Self {
            running: true,
            watchlist: Vec::new(),
            selected_index: 0,
            current_screen: Screen::Dashboard,
            granularity: Granularity::default(),
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            input_buffer: String::new(),
            input_prompt: String::new(),
            confirm_delete: false,
            chart: ChartEngine::new(),
            active_symbol: String::new(),
            candles: Vec::new(),
            analysis: None,
            chart_area: None,
            show_patterns: true,
        }
    }

    /// Crée une App avec une watchlist préchargée
    pub fn with_watchlist(watchlist: Vec<WatchedSymbol>) -> Self {
        Self {
            watchlist,
            ..Self::new()
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Navigue vers le haut dans la watchlist
    ///
    /// CONCEPT RUST : Saturating arithmetic
    /// - saturating_sub() : soustrait mais ne descend pas en dessous de 0
    /// - Évite les panics avec les unsigned
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Navigue vers le bas dans la watchlist
    pub fn navigate_down(&mut self) {
        let max_index = self.watchlist.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Retourne le symbole sélectionné dans la watchlist
    pub fn selected_item(&self) -> Option<&WatchedSymbol> {
        self.watchlist.get(self.selected_index)
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// CONCEPT : Event Loop Pattern
    /// - tick() est appelé régulièrement (chaque frame)
    /// - Permet de mettre à jour l'état même sans événement utilisateur
    pub fn tick(&mut self) {
        // Rien à rafraîchir périodiquement pour l'instant
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Vérifie si on est sur le dashboard
    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    /// Vérifie si on est sur la vue chart
    pub fn is_on_chart(&self) -> bool {
        self.current_screen == Screen::ChartView
    }

    // ========================================================================
    // Vue chart
    // ========================================================================

    /// Ouvre la vue chart sur le symbole sélectionné
    ///
    /// Le verdict déjà connu de la watchlist est repris immédiatement, les
    /// chandelles repartent de zéro : l'appelant doit demander un
    /// rechargement au worker. Retourne false si la watchlist est vide.
    pub fn open_selected_chart(&mut self) -> bool {
        let Some(item) = self.watchlist.get(self.selected_index) else {
            return false;
        };
        self.active_symbol = item.symbol.clone();
        self.analysis = item.analysis.clone();
        self.candles.clear();
        self.chart.teardown();
        self.chart_area = None;
        self.current_screen = Screen::ChartView;
        true
    }

    /// Ferme la vue chart et retourne au dashboard
    ///
    /// Le chart est démonté : la surface est jetée et les dessins manuels
    /// ne survivent pas à la sortie de la vue.
    pub fn close_chart(&mut self) {
        self.chart.teardown();
        self.chart_area = None;
        self.current_screen = Screen::Dashboard;
    }

    /// Passe à la granularité suivante (M1 → M5 → ... → MN1 → M1)
    ///
    /// Les chandelles courantes appartiennent à l'ancienne granularité : on
    /// les écarte et le chart repasse par l'état vide en attendant le
    /// rechargement. Les dessins manuels survivent au changement.
    pub fn next_granularity(&mut self) {
        self.granularity = self.granularity.next();
        self.invalidate_chart_data();
    }

    /// Passe à la granularité précédente
    pub fn previous_granularity(&mut self) {
        self.granularity = self.granularity.previous();
        self.invalidate_chart_data();
    }

    fn invalidate_chart_data(&mut self) {
        self.candles.clear();
        self.chart.mark_dirty();
    }

    /// Inverse un indicateur depuis son raccourci clavier
    ///
    /// Retourne false si le caractère ne correspond à aucun indicateur.
    /// Tout changement de toggle invalide le chart : la surface est
    /// entièrement reconstruite au prochain tour de boucle.
    pub fn toggle_overlay(&mut self, key: char) -> bool {
        let toggles = &mut self.chart.toggles;
        let flag = match key {
            '1' => &mut toggles.sma_20,
            '2' => &mut toggles.sma_50,
            '3' => &mut toggles.ema_20,
            'b' => &mut toggles.bollinger,
            'r' => &mut toggles.rsi,
            'm' => &mut toggles.macd,
            'v' => &mut toggles.volume,
            _ => return false,
        };
        *flag = !*flag;
        self.chart.mark_dirty();
        true
    }

    /// Affiche ou masque le panneau latéral des figures
    pub fn toggle_patterns_panel(&mut self) {
        self.show_patterns = !self.show_patterns;
    }

    /// Intègre un rapport du backend (chandelles + verdict)
    ///
    /// Deux destinations : la ligne de watchlist correspondante (série
    /// normalisée pour le prix et la variation) et, si le rapport correspond
    /// au symbole et à la granularité affichés, la vue chart.
    pub fn apply_report(&mut self, index: usize, report: AnalysisReport) {
        let matches_view = self.current_screen == Screen::ChartView
            && report.symbol == self.active_symbol
            && report.granularity == self.granularity;

        if let Some(item) = self.watchlist.get_mut(index) {
            if item.symbol == report.symbol {
                let mut series = CandleSeries::new(report.symbol.clone(), report.granularity);
                series.candles = normalize_candles(&report.candles, report.granularity);
                item.series = Some(series);
                item.analysis = Some(report.analysis.clone());
            }
        }

        if matches_view {
            self.candles = report.candles;
            self.analysis = Some(report.analysis);
            self.chart.mark_dirty();
        }
    }

    // ========================================================================
    // Quit Confirmation Management
    // ========================================================================

    /// Demande la confirmation de quitter
    ///
    /// CONCEPT : Two-step quit pattern
    /// - Première pression de 'q' : active confirm_quit
    /// - Deuxième pression : quit réel
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    /// Vérifie si des données sont en cours de chargement
    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode input avec un prompt donné
    ///
    /// CONCEPT : Modal input (Vim-like)
    /// - Change l'écran vers InputMode
    /// - Initialise le buffer vide
    /// - Configure le prompt à afficher
    pub fn start_input(&mut self, prompt: String) {
        self.current_screen = Screen::InputMode;
        self.input_buffer.clear();
        self.input_prompt = prompt;
    }

    /// Annule le mode input et retourne au dashboard
    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
        self.input_prompt.clear();
    }

    /// Récupère la valeur saisie et retourne au dashboard
    pub fn submit_input(&mut self) -> String {
        let value = self.input_buffer.clone();
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
        self.input_prompt.clear();
        value
    }

    /// Ajoute un caractère au buffer d'input
    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    /// Supprime le dernier caractère du buffer
    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    /// Vérifie si on est en mode input
    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }

    // ========================================================================
    // Delete Confirmation Management
    // ========================================================================

    /// Demande la confirmation de suppression
    ///
    /// CONCEPT : Two-step delete pattern (Vim-like)
    /// - Première pression de 'd' : demande confirmation
    /// - Deuxième pression : suppression réelle
    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    /// Annule la demande de suppression
    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    /// Vérifie si on attend la confirmation de suppression
    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    /// Supprime le symbole sélectionné de la watchlist
    ///
    /// CONCEPT : Safe deletion
    /// - Supprime l'item à selected_index
    /// - Ajuste selected_index si nécessaire
    /// - Reset confirm_delete
    pub fn delete_selected(&mut self) {
        if self.selected_index < self.watchlist.len() {
            self.watchlist.remove(self.selected_index);

            // Ajuste l'index si on a supprimé le dernier élément
            if self.selected_index >= self.watchlist.len() && self.selected_index > 0 {
                self.selected_index -= 1;
            }
        }

        self.confirm_delete = false;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candle::RawTimestamp;

    fn sample_watchlist() -> Vec<WatchedSymbol> {
        vec![
            WatchedSymbol::new("AAPL".to_string(), "Apple Inc.".to_string()),
            WatchedSymbol::new("TSLA".to_string(), "Tesla".to_string()),
            WatchedSymbol::new("BTC-USD".to_string(), "Bitcoin".to_string()),
        ]
    }

    fn sample_report(symbol: &str, granularity: Granularity) -> AnalysisReport {
        AnalysisReport {
            symbol: symbol.to_string(),
            granularity,
            candles: vec![
                RawCandle::new(RawTimestamp::Text("2024-01-01".into()), 10.0, 11.0, 9.0, 10.5),
                RawCandle::new(RawTimestamp::Text("2024-01-02".into()), 10.5, 12.0, 10.0, 11.5),
            ],
            analysis: AnalysisSnapshot {
                score: 72.0,
                signal: "BUY".to_string(),
                ..AnalysisSnapshot::default()
            },
        }
    }

    #[test]
    fn test_app_creation() {
        let app = App::new();
        assert!(app.is_running());
        assert!(app.watchlist.is_empty());
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.granularity, Granularity::D1);
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::new();
        assert!(app.is_running());

        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_navigation() {
        let mut app = App::with_watchlist(sample_watchlist());

        assert_eq!(app.selected_index, 0);

        app.navigate_down();
        assert_eq!(app.selected_index, 1);
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        // Navigate down au max : reste à 2
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        app.navigate_up();
        assert_eq!(app.selected_index, 1);
        app.navigate_up();
        app.navigate_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_open_chart_on_selected_symbol() {
        let mut app = App::with_watchlist(sample_watchlist());
        app.navigate_down();

        assert!(app.open_selected_chart());
        assert!(app.is_on_chart());
        assert_eq!(app.active_symbol, "TSLA");
        assert!(app.candles.is_empty());
    }

    #[test]
    fn test_open_chart_with_empty_watchlist() {
        let mut app = App::new();
        assert!(!app.open_selected_chart());
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_close_chart_discards_drawings() {
        let mut app = App::with_watchlist(sample_watchlist());
        app.open_selected_chart();
        app.chart.select_tool(crate::models::drawing::DrawingTool::HorizontalLine);

        app.close_chart();
        assert!(app.is_on_dashboard());
        assert!(app.chart_area.is_none());
        assert!(!app.chart.drawing.tool().is_armed());
    }

    #[test]
    fn test_granularity_change_discards_candles() {
        let mut app = App::with_watchlist(sample_watchlist());
        app.open_selected_chart();
        app.candles = vec![RawCandle::new(
            RawTimestamp::Epoch(1_700_000_000),
            10.0,
            11.0,
            9.0,
            10.5,
        )];

        app.next_granularity();
        assert!(app.candles.is_empty());
        assert!(app.chart.needs_rebuild());
        assert_ne!(app.granularity, Granularity::D1);
    }

    #[test]
    fn test_toggle_overlay_marks_chart_dirty() {
        let mut app = App::new();
        assert!(!app.chart.toggles.rsi);

        assert!(app.toggle_overlay('r'));
        assert!(app.chart.toggles.rsi);
        assert!(app.chart.needs_rebuild());

        // Caractère inconnu : aucun effet
        assert!(!app.toggle_overlay('z'));
    }

    #[test]
    fn test_apply_report_routes_to_watchlist_and_chart() {
        let mut app = App::with_watchlist(sample_watchlist());
        app.open_selected_chart();
        // Consomme le dirty du teardown initial
        let _ = app.chart.needs_rebuild();
        app.chart.rebuild("AAPL", app.granularity, &[], None);

        app.apply_report(0, sample_report("AAPL", Granularity::D1));

        // La ligne de watchlist est rafraîchie avec la série normalisée
        let item = &app.watchlist[0];
        assert!(item.has_data());
        assert_eq!(item.series.as_ref().unwrap().candles.len(), 2);

        // La vue chart reçoit les chandelles brutes et repasse dirty
        assert_eq!(app.candles.len(), 2);
        assert!(app.analysis.is_some());
        assert!(app.chart.needs_rebuild());
    }

    #[test]
    fn test_apply_report_ignores_stale_granularity() {
        let mut app = App::with_watchlist(sample_watchlist());
        app.open_selected_chart();
        let _ = app.chart.needs_rebuild();
        app.chart.rebuild("AAPL", app.granularity, &[], None);

        // Rapport d'une granularité qui n'est plus affichée
        app.apply_report(0, sample_report("AAPL", Granularity::M15));

        assert!(app.candles.is_empty());
        assert!(!app.chart.needs_rebuild());
    }

    #[test]
    fn test_delete_selected_adjusts_index() {
        let mut app = App::with_watchlist(sample_watchlist());
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        app.request_delete();
        assert!(app.is_awaiting_delete_confirmation());
        app.delete_selected();

        assert_eq!(app.watchlist.len(), 2);
        assert_eq!(app.selected_index, 1);
        assert!(!app.is_awaiting_delete_confirmation());
    }

    #[test]
    fn test_input_mode_round_trip() {
        let mut app = App::new();
        app.start_input("Ajouter un symbole : ".to_string());
        assert!(app.is_in_input_mode());

        app.append_char('N');
        app.append_char('V');
        app.append_char('D');
        app.append_char('A');
        app.backspace();
        app.append_char('A');

        let value = app.submit_input();
        assert_eq!(value, "NVDA");
        assert!(app.is_on_dashboard());
        assert!(app.input_buffer.is_empty());
    }
}
