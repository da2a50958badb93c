// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier, souris, redimensionnement et les ticks
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : router chaque événement vers son traitement
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};

// ============================================================================
// Enum Event
// ============================================================================
// CONCEPT RUST : Enums avec données
// - Chaque variant peut contenir des données différentes
// - Key(KeyEvent) : stocke l'événement clavier complet
// - Resize(u16, u16) : nouvelles dimensions du terminal
// - Tick : variant sans données (unit variant)
// ============================================================================

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Événement souris (clic, déplacement)
    Mouse(MouseEvent),

    /// Terminal redimensionné (largeur, hauteur)
    Resize(u16, u16),

    /// Tick régulier (pour animations, rafraîchissement)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    /// Crée un nouveau gestionnaire d'événements
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    /// - Si événement, le lit et le convertit
    pub fn next(&self) -> Result<Event> {
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                // Événement clavier
                // CONCEPT : Filter sur KeyEventKind
                // Sur certains OS, on reçoit Press ET Release
                // On ne veut gérer que Press pour éviter les doublons
                CrosstermEvent::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        Ok(Event::Key(key))
                    } else {
                        Ok(Event::Tick)
                    }
                }

                // Souris : seuls le clic gauche et le déplacement nous
                // intéressent (dessin sur le chart), le reste est un tick
                CrosstermEvent::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Moved => {
                        Ok(Event::Mouse(mouse))
                    }
                    _ => Ok(Event::Tick),
                },

                // Redimensionnement : invalide les dimensions du chart
                CrosstermEvent::Resize(width, height) => Ok(Event::Resize(width, height)),

                _ => Ok(Event::Tick),
            }
        } else {
            // Timeout : pas d'événement, retourne Tick
            Ok(Event::Tick)
        }
    }
}

// ============================================================================
// Helpers : Convertir les événements en actions
// ============================================================================
// CONCEPT RUST : Pattern matching avancé
// - Match sur KeyCode pour identifier la touche
// - matches! avec plusieurs patterns séparés par |
// ============================================================================

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

/// Vérifie si l'événement est Entrée
pub fn is_enter_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Enter)
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche gauche (granularité précédente)
pub fn is_left_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Left)
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche droite (granularité suivante)
pub fn is_right_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Right)
    } else {
        false
    }
}

/// Vérifie si l'événement est 'a' (add : ajouter un symbole)
pub fn is_add_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('a') | KeyCode::Char('A'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'd' (delete : retirer un symbole)
pub fn is_delete_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('d') | KeyCode::Char('D'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Backspace)
    } else {
        false
    }
}

/// Vérifie si l'événement est un caractère valide pour un symbole boursier
pub fn is_ticker_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(c) if c.is_alphanumeric() || c == '-' || c == '.' || c == '=')
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

/// Position (colonne, ligne) d'un événement souris
pub fn mouse_position(event: &Event) -> Option<(u16, u16)> {
    if let Event::Mouse(mouse) = event {
        Some((mouse.column, mouse.row))
    } else {
        None
    }
}

/// Vérifie si l'événement est un clic gauche
pub fn is_left_click(event: &Event) -> bool {
    if let Event::Mouse(mouse) = event {
        matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left))
    } else {
        false
    }
}

/// Vérifie si l'événement est un déplacement de souris
pub fn is_mouse_move(event: &Event) -> bool {
    if let Event::Mouse(mouse) = event {
        matches!(mouse.kind, MouseEventKind::Moved)
    } else {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key('q')));
        assert!(is_quit_event(&key('Q')));
        assert!(!is_quit_event(&key('a')));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_ticker_chars() {
        assert!(is_ticker_char_event(&key('A')));
        assert!(is_ticker_char_event(&key('5')));
        assert!(is_ticker_char_event(&key('.'))); // 005930.KS
        assert!(is_ticker_char_event(&key('='))); // EURUSD=X
        assert!(!is_ticker_char_event(&key(' ')));
    }

    #[test]
    fn test_mouse_helpers() {
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 7,
            modifiers: KeyModifiers::empty(),
        });
        assert!(is_left_click(&click));
        assert!(!is_mouse_move(&click));
        assert_eq!(mouse_position(&click), Some((12, 7)));

        let moved = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::empty(),
        });
        assert!(is_mouse_move(&moved));
        assert!(!is_left_click(&moved));

        assert_eq!(mouse_position(&Event::Tick), None);
    }

    #[test]
    fn test_arrow_events() {
        let left = Event::Key(KeyEvent::new(KeyCode::Left, KeyModifiers::empty()));
        let right = Event::Key(KeyEvent::new(KeyCode::Right, KeyModifiers::empty()));
        assert!(is_left_event(&left));
        assert!(is_right_event(&right));
        assert!(!is_left_event(&right));
    }
}
