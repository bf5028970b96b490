//! The script injected into every page, and the messages it exchanges with
//! the host.

use crate::config::Chord;
use crate::overlay::OverlayView;
use serde::Deserialize;

/// Messages posted by the content script over `window.ipc`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PageEvent {
    Ready { url: String },
    Selection { text: String },
    Trigger { selection: String },
}

impl PageEvent {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

const CONTENT_SCRIPT: &str = r#"
(function() {
  if (window.__syncflo) { return; }
  var CHORDS = __CHORDS__;
  var overlay = null;
  var lastSelection = '';

  function post(message) {
    if (window.ipc) { window.ipc.postMessage(JSON.stringify(message)); }
  }

  function currentSelection() {
    var sel = window.getSelection();
    return sel ? sel.toString() : '';
  }

  function ensureOverlay() {
    if (overlay && document.body && document.body.contains(overlay)) { return overlay; }
    overlay = document.createElement('div');
    overlay.id = 'syncflo-answer-overlay';
    overlay.style.cssText = 'position:fixed;bottom:5px;left:5px;background-color:rgba(0,0,0,0.2);' +
      'color:rgba(255,255,255,0.4);padding:3px 5px;border-radius:2px;z-index:10000;max-width:100px;' +
      'font-family:Arial,sans-serif;font-size:10px;display:none;pointer-events:none;user-select:none;';
    (document.body || document.documentElement).appendChild(overlay);
    return overlay;
  }

  function matches(event, chord) {
    return event.ctrlKey === chord.ctrl && event.altKey === chord.alt &&
      event.shiftKey === chord.shift && event.metaKey === chord.meta &&
      (event.key || '').toLowerCase() === chord.key;
  }

  document.addEventListener('keydown', function(event) {
    for (var i = 0; i < CHORDS.length; i++) {
      if (matches(event, CHORDS[i])) {
        event.preventDefault();
        post({ op: 'trigger', selection: currentSelection() });
        return;
      }
    }
  }, true);

  document.addEventListener('selectionchange', function() {
    var text = currentSelection();
    if (text !== lastSelection) {
      lastSelection = text;
      post({ op: 'selection', text: text });
    }
  });

  window.__syncflo = {
    render: function(view) {
      var el = ensureOverlay();
      el.textContent = view.text;
      el.style.display = view.visible ? 'block' : 'none';
    },
    copy: function(text) {
      var area = document.createElement('textarea');
      area.value = text;
      area.style.position = 'fixed';
      area.style.left = '-999999px';
      area.style.top = '-999999px';
      document.body.appendChild(area);
      area.focus();
      area.select();
      try { document.execCommand('copy'); } catch (err) { console.error('Failed to copy text:', err); }
      area.remove();
    }
  };

  function ready() {
    ensureOverlay();
    post({ op: 'ready', url: window.location.href });
  }
  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', ready);
  } else {
    ready();
  }
})();
"#;

/// The initialization script with `shortcuts` baked in.
pub fn content_script(shortcuts: &[Chord]) -> Result<String, serde_json::Error> {
    Ok(CONTENT_SCRIPT.replace("__CHORDS__", &serde_json::to_string(shortcuts)?))
}

pub fn render_overlay_js(view: &OverlayView) -> Result<String, serde_json::Error> {
    Ok(format!(
        "window.__syncflo && window.__syncflo.render({});",
        serde_json::to_string(view)?
    ))
}

pub fn legacy_copy_js(text: &str) -> Result<String, serde_json::Error> {
    Ok(format!(
        "window.__syncflo && window.__syncflo.copy({});",
        serde_json::to_string(text)?
    ))
}
