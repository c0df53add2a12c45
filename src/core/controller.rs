//! Terminal controller.
//!
//! Bridges keyboard input to command execution and drives the single active
//! typewriter animation. Owns the session state: the in-progress command
//! buffer, the input cursor, the interrupt flag, and the full-CV playback
//! cursor.

use std::collections::HashMap;
use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthChar;

use super::animation::{Completion, Step, Typewriter};
use crate::config::CvConfig;
use crate::ui::Term;

/// What the main loop should do after a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Mutable per-session state, owned exclusively by the controller.
#[derive(Debug)]
pub struct SessionState {
    /// In-progress typed command, reset on submit
    pub command: String,
    /// Input cursor offset in characters; never drops below the prompt length
    pub cursor_x: usize,
    /// Set by Ctrl+C during an animation, consumed by the next tick
    pub interrupted: bool,
    /// Full-CV playback active
    pub full_cv: bool,
    /// Cursor into the section registry during full-CV playback
    pub section_index: usize,
}

/// The interactive command/animation loop over a [`Term`].
pub struct Controller<W: io::Write> {
    term: Term<W>,
    prompt: String,
    prompt_len: usize,
    welcome: Vec<String>,
    commands: Vec<String>,
    sections: Vec<String>,
    content: HashMap<String, Vec<String>>,
    pub state: SessionState,
    animation: Option<Typewriter>,
}

impl<W: io::Write> Controller<W> {
    pub fn new(term: Term<W>, cv: CvConfig) -> Self {
        let prompt_len = cv.prompt.chars().count();
        Self {
            term,
            prompt: cv.prompt,
            prompt_len,
            welcome: cv.welcome,
            commands: cv.commands,
            sections: cv.sections,
            content: cv.content,
            state: SessionState {
                command: String::new(),
                cursor_x: prompt_len,
                interrupted: false,
                full_cv: false,
                section_index: 0,
            },
            animation: None,
        }
    }

    /// Print the welcome banner and the first prompt.
    pub fn start(&mut self) -> io::Result<()> {
        for line in self.welcome.clone() {
            self.term.writeln(&line)?;
        }
        self.write_prompt()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Forward a terminal resize to the display surface. Independent of the
    /// command/animation state, safe at any time.
    pub fn fit(&mut self, cols: u16, rows: u16) -> bool {
        self.term.fit(cols, rows)
    }

    /// Process one decoded key event.
    pub fn handle_key(&mut self, key: KeyEvent) -> io::Result<Flow> {
        let is_ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'));

        // While animating only the interrupt combination is honored; any
        // other key is dropped without buffering.
        if self.is_animating() {
            if is_ctrl_c {
                debug!("interrupt requested");
                self.state.interrupted = true;
            }
            return Ok(Flow::Continue);
        }

        match key.code {
            KeyCode::Backspace => self.handle_backspace()?,
            KeyCode::Enter => self.handle_return()?,
            // History and cursor movement are not supported
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {}
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(Flow::Exit);
            }
            KeyCode::Char(c) if is_printable(&key) => self.handle_input(c)?,
            _ => {}
        }
        Ok(Flow::Continue)
    }

    /// Advance the active animation by one frame, if any.
    pub fn tick(&mut self) -> io::Result<()> {
        if self.animation.is_none() {
            return Ok(());
        }
        if self.state.interrupted {
            self.stop_animation();
            self.term.write("\r\n\nInterrupted\r\n\n")?;
            return self.write_prompt();
        }

        let step = match self.animation.as_mut() {
            Some(tw) => tw.step(),
            None => return Ok(()),
        };
        match step {
            Step::Char(c) => {
                self.term.write_char(c)?;
                // Home the cursor after a bare line feed in raw mode
                if c == '\n' {
                    self.term.write_char('\r')?;
                }
            }
            Step::Done => {
                let completion = match self.animation.take() {
                    Some(tw) => tw.completion(),
                    None => Completion::Prompt,
                };
                self.term.writeln("\r")?;
                match completion {
                    Completion::Prompt => self.write_prompt()?,
                    Completion::NextSection => self.advance_full_cv()?,
                }
            }
        }
        Ok(())
    }

    fn handle_backspace(&mut self) -> io::Result<()> {
        if self.state.cursor_x <= self.prompt_len {
            return Ok(());
        }
        if let Some(c) = self.state.command.pop() {
            let width = UnicodeWidthChar::width(c).unwrap_or(1).max(1);
            for _ in 0..width {
                self.term.write("\x08 \x08")?;
            }
        }
        self.state.cursor_x -= 1;
        Ok(())
    }

    fn handle_return(&mut self) -> io::Result<()> {
        self.term.writeln("")?;
        self.handle_command()?;
        self.state.command.clear();
        self.state.cursor_x = self.prompt_len;
        // An animation defers the prompt to its completion
        if !self.is_animating() {
            self.write_prompt()?;
        }
        Ok(())
    }

    fn handle_input(&mut self, c: char) -> io::Result<()> {
        self.term.write_char(c)?;
        self.state.command.push(c);
        self.state.cursor_x += 1;
        Ok(())
    }

    fn write_prompt(&mut self) -> io::Result<()> {
        let prompt = self.prompt.clone();
        self.term.write(&prompt)
    }

    fn handle_command(&mut self) -> io::Result<()> {
        let cmd = self.state.command.trim().to_string();

        if !self.commands.iter().any(|c| *c == cmd) {
            debug!(command = %cmd, "not recognized");
            self.term
                .writeln(&format!(" ERROR: Command not recognized: {}!", cmd))?;
            self.term.writeln("Type 'help' to see available commands.")?;
            return Ok(());
        }

        debug!(command = %cmd, "dispatch");
        match cmd.as_str() {
            "help" => self.write_help(),
            "fullcv" => self.start_full_cv(),
            _ => self.write_section(&cmd),
        }
    }

    fn write_help(&mut self) -> io::Result<()> {
        let mut help = String::from("\n  AVAILABLE COMMANDS:\n\n");
        for cmd in &self.commands {
            help.push_str("- ");
            help.push_str(cmd);
            help.push('\n');
        }
        self.animation = Some(Typewriter::new(&help, Completion::Prompt));
        Ok(())
    }

    fn start_full_cv(&mut self) -> io::Result<()> {
        self.state.full_cv = true;
        self.state.section_index = 0;
        self.advance_full_cv()
    }

    fn write_section(&mut self, name: &str) -> io::Result<()> {
        let body = match self.content.get(name) {
            Some(lines) => format!("\r\n{}", lines.join("\n")),
            None => {
                // Startup validation makes this unreachable; degrade gracefully
                warn!(section = %name, "missing from content map");
                return self.write_prompt();
            }
        };

        self.term.writeln(&format!("\n  {}", name.to_uppercase()))?;
        if self.state.interrupted {
            return Ok(());
        }

        let completion = if self.state.full_cv {
            Completion::NextSection
        } else {
            Completion::Prompt
        };
        self.animation = Some(Typewriter::new(&body, completion));
        Ok(())
    }

    fn advance_full_cv(&mut self) -> io::Result<()> {
        if self.state.section_index >= self.sections.len() {
            self.reset_full_cv();
            return self.write_prompt();
        }
        let name = self.sections[self.state.section_index].clone();
        self.state.section_index += 1;
        self.write_section(&name)
    }

    fn stop_animation(&mut self) {
        self.animation = None;
        self.state.interrupted = false;
        self.reset_full_cv();
    }

    fn reset_full_cv(&mut self) {
        self.state.section_index = 0;
        self.state.full_cv = false;
    }
}

#[cfg(test)]
impl Controller<Vec<u8>> {
    fn output(&self) -> String {
        String::from_utf8_lossy(self.term.out()).into_owned()
    }
}

fn is_printable(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(
        KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cv() -> CvConfig {
        let mut cv = CvConfig::default();
        cv.prompt = "root > ".to_string();
        cv.welcome.clear();
        cv.commands = vec![
            "about".to_string(),
            "contact".to_string(),
            "help".to_string(),
            "fullcv".to_string(),
        ];
        cv.sections = vec!["about".to_string(), "contact".to_string()];
        cv.content.clear();
        cv.content
            .insert("about".to_string(), vec!["L1".to_string(), "L2".to_string()]);
        cv.content
            .insert("contact".to_string(), vec!["C1".to_string()]);
        cv
    }

    fn controller() -> Controller<Vec<u8>> {
        let term = Term::new(Vec::new(), vec![], 50, 22);
        Controller::new(term, test_cv())
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn type_str(c: &mut Controller<Vec<u8>>, s: &str) {
        for ch in s.chars() {
            c.handle_key(key(KeyCode::Char(ch), KeyModifiers::NONE))
                .unwrap();
        }
    }

    fn submit(c: &mut Controller<Vec<u8>>, s: &str) {
        type_str(c, s);
        c.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)).unwrap();
    }

    fn run_to_idle(c: &mut Controller<Vec<u8>>) {
        let mut guard = 0;
        while c.is_animating() {
            c.tick().unwrap();
            guard += 1;
            assert!(guard < 10_000, "animation never finished");
        }
    }

    #[test]
    fn test_unknown_command_reports_error_and_resets() {
        let mut c = controller();
        submit(&mut c, "xyz");

        let out = c.output();
        assert_eq!(
            out,
            "xyz\r\n ERROR: Command not recognized: xyz!\r\nType 'help' to see available commands.\r\nroot > "
        );
        assert!(c.state.command.is_empty());
        assert_eq!(c.state.cursor_x, "root > ".chars().count());
        assert!(!c.is_animating());
    }

    #[test]
    fn test_empty_submit_is_not_recognized() {
        let mut c = controller();
        c.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)).unwrap();
        assert!(c.output().contains(" ERROR: Command not recognized: !"));
    }

    #[test]
    fn test_section_command_renders_header_and_lines() {
        let mut c = controller();
        submit(&mut c, "about");
        assert!(c.is_animating(), "section render goes through the animation");
        run_to_idle(&mut c);

        let out = c.output();
        // Echo, blank line, uppercased header, animated body with homing
        // carriage returns, trailer, then the deferred prompt.
        assert_eq!(
            out,
            "about\r\n\n  ABOUT\r\n\r\n\rL1\n\rL2\r\r\nroot > "
        );
        assert_eq!(out.matches("L1").count(), 1);
        assert_eq!(out.matches("L2").count(), 1);
    }

    #[test]
    fn test_command_whitespace_is_trimmed() {
        let mut c = controller();
        submit(&mut c, "  contact ");
        run_to_idle(&mut c);
        assert!(c.output().contains("CONTACT"));
        assert!(c.output().contains("C1"));
    }

    #[test]
    fn test_help_lists_registry_in_order() {
        let mut c = controller();
        submit(&mut c, "help");
        run_to_idle(&mut c);

        let out = c.output();
        assert!(out.contains("AVAILABLE COMMANDS:"));
        let about = out.find("- about").unwrap();
        let contact = out.find("- contact").unwrap();
        let fullcv = out.find("- fullcv").unwrap();
        assert!(about < contact && contact < fullcv);
        assert!(out.ends_with("root > "));
    }

    #[test]
    fn test_fullcv_visits_every_section_once_in_order() {
        let mut c = controller();
        submit(&mut c, "fullcv");
        run_to_idle(&mut c);

        let out = c.output();
        assert_eq!(out.matches("ABOUT").count(), 1);
        assert_eq!(out.matches("CONTACT").count(), 1);
        assert!(out.find("ABOUT").unwrap() < out.find("CONTACT").unwrap());
        assert!(out.ends_with("root > "));
        assert!(!c.state.full_cv);
        assert_eq!(c.state.section_index, 0);
    }

    #[test]
    fn test_keys_ignored_while_animating() {
        let mut c = controller();
        submit(&mut c, "about");
        let before = c.output().len();

        type_str(&mut c, "zz");
        c.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)).unwrap();
        assert_eq!(c.output().len(), before, "no echo while animating");
        assert!(c.state.command.is_empty(), "no buffering while animating");
    }

    #[test]
    fn test_interrupt_halts_animation_and_resets_fullcv() {
        let mut c = controller();
        submit(&mut c, "fullcv");
        c.tick().unwrap();
        c.tick().unwrap();

        c.handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(c.state.interrupted, "flag set, consumed at the next tick");
        assert!(c.is_animating());

        c.tick().unwrap();
        assert!(!c.is_animating());
        assert!(!c.state.interrupted);
        assert!(!c.state.full_cv);
        assert_eq!(c.state.section_index, 0);
        assert!(c.output().ends_with("\r\n\nInterrupted\r\n\nroot > "));

        // No further characters after the interrupt
        let len = c.output().len();
        c.tick().unwrap();
        assert_eq!(c.output().len(), len);
    }

    #[test]
    fn test_ctrl_c_while_idle_is_ignored() {
        let mut c = controller();
        c.handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(c.output().is_empty());
        assert!(!c.state.interrupted);
    }

    #[test]
    fn test_backspace_stops_at_prompt_boundary() {
        let mut c = controller();
        type_str(&mut c, "ab");
        for _ in 0..3 {
            c.handle_key(key(KeyCode::Backspace, KeyModifiers::NONE))
                .unwrap();
        }
        assert!(c.state.command.is_empty());
        assert_eq!(c.state.cursor_x, c.prompt_len);
        assert_eq!(c.output().matches("\x08 \x08").count(), 2);
    }

    #[test]
    fn test_backspace_erases_wide_char_fully() {
        let mut c = controller();
        type_str(&mut c, "日");
        c.handle_key(key(KeyCode::Backspace, KeyModifiers::NONE))
            .unwrap();
        // Two columns erased for a double-width character
        assert_eq!(c.output().matches("\x08 \x08").count(), 2);
        assert!(c.state.command.is_empty());
    }

    #[test]
    fn test_arrow_keys_are_noops() {
        let mut c = controller();
        type_str(&mut c, "ab");
        let before = c.output();
        for code in [KeyCode::Up, KeyCode::Down, KeyCode::Left, KeyCode::Right] {
            c.handle_key(key(code, KeyModifiers::NONE)).unwrap();
        }
        assert_eq!(c.output(), before);
        assert_eq!(c.state.command, "ab");
    }

    #[test]
    fn test_modified_chars_are_not_typed() {
        let mut c = controller();
        c.handle_key(key(KeyCode::Char('x'), KeyModifiers::ALT))
            .unwrap();
        assert!(c.state.command.is_empty());
        assert!(c.output().is_empty());
    }

    #[test]
    fn test_ctrl_d_exits_at_prompt() {
        let mut c = controller();
        let flow = c
            .handle_key(key(KeyCode::Char('d'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(flow, Flow::Exit);

        // But not during an animation
        submit(&mut c, "about");
        let flow = c
            .handle_key(key(KeyCode::Char('d'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn test_welcome_banner() {
        let mut cv = test_cv();
        cv.welcome = vec!["hi".to_string(), "there".to_string()];
        let term = Term::new(Vec::new(), vec![], 50, 22);
        let mut c = Controller::new(term, cv);
        c.start().unwrap();
        assert_eq!(c.output(), "hi\r\nthere\r\nroot > ");
    }
}
