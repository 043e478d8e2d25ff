pub const GLOBAL_CSS: &str = r#"
:root {
  --bg: #05090f;
  --bg-elev-1: #0b111a;
  --bg-elev-2: #111a26;
  --panel: #0d1520;
  --border: rgba(255, 255, 255, 0.08);
  --border-strong: rgba(255, 255, 255, 0.16);
  --text: #e6edf7;
  --text-dim: #b7c6d9;
  --text-muted: #7f8ba0;
  --accent: #5cb0ff;
  --accent-strong: #7ac6ff;
  --positive: #3fb68b;
  --negative: #f0635c;
  --warning: #f7c843;
  --surface-hover: rgba(255, 255, 255, 0.05);
  --shadow-soft: 0 14px 42px rgba(0, 0, 0, 0.38);
  --radius: 10px;
  --radius-pill: 999px;
  --space-1: 4px;
  --space-2: 8px;
  --space-3: 12px;
  --space-4: 16px;
  --font-body: "Inter", "SF Pro Text", system-ui, -apple-system, sans-serif;
  --font-mono: "JetBrains Mono", "SFMono-Regular", ui-monospace, monospace;
  --font-size-xs: 11px;
  --font-size-sm: 13px;
  --font-size-md: 15px;
  --font-size-lg: 17px;
  --transition: 140ms ease-out;
}

* { box-sizing: border-box; }
html, body {
  padding: 0;
  margin: 0;
  background: var(--bg);
  color: var(--text);
  font-family: var(--font-body);
  font-size: var(--font-size-sm);
  line-height: 1.4;
  min-height: 100%;
}

button {
  font-family: var(--font-body);
  background: var(--bg-elev-2);
  color: var(--text);
  border: 1px solid var(--border-strong);
  border-radius: var(--radius);
  padding: var(--space-2) var(--space-3);
  cursor: pointer;
  transition: background var(--transition), border-color var(--transition);
}
button:hover:not(:disabled) { background: var(--surface-hover); border-color: var(--accent); }
button:disabled { opacity: 0.45; cursor: not-allowed; }
button.primary { background: rgba(92, 176, 255, 0.16); border-color: var(--accent); }
button.danger { border-color: rgba(240, 99, 92, 0.5); color: var(--negative); }

input, select {
  background: var(--bg-elev-1);
  border: 1px solid var(--border);
  color: var(--text);
  padding: var(--space-2) var(--space-3);
  border-radius: var(--radius);
  font-size: var(--font-size-sm);
  outline: none;
  transition: border-color var(--transition), box-shadow var(--transition);
}
input:focus, select:focus {
  border-color: var(--accent);
  box-shadow: 0 0 0 1px rgba(77, 163, 255, 0.35);
}

.panel { background: var(--panel); border: 1px solid var(--border); border-radius: var(--radius); box-shadow: var(--shadow-soft); padding: var(--space-3); }
.section-label { font-size: var(--font-size-xs); color: var(--text-muted); letter-spacing: 0.04em; text-transform: uppercase; }
.flex-row { display: flex; gap: var(--space-2); align-items: center; flex-wrap: wrap; }
.muted { color: var(--text-muted); font-size: var(--font-size-xs); }
.file-list { list-style: none; margin: 0; padding: 0; max-height: 180px; overflow-y: auto; }
.file-entry { width: 100%; text-align: left; background: none; border: none; color: inherit; padding: 2px 0; cursor: pointer; font-family: monospace; }
.file-entry:hover { text-decoration: underline; }
.flex-col { display: flex; flex-direction: column; gap: var(--space-2); }
.flex-between { display: flex; justify-content: space-between; align-items: center; }
.input-stack { display: flex; flex-direction: column; gap: var(--space-1); }
.input-label { font-size: var(--font-size-xs); color: var(--text-muted); }

.dash-app { min-height: 100vh; }
.dash-shell { display: flex; flex-direction: column; gap: var(--space-4); padding: var(--space-4); }
.dash-topbar { display: flex; align-items: center; justify-content: space-between; gap: var(--space-4); }
.brand-title { font-size: var(--font-size-lg); font-weight: 600; letter-spacing: 0.03em; }
.dash-body { display: grid; grid-template-columns: 340px minmax(0, 1fr); gap: var(--space-4); }
.dash-side { display: flex; flex-direction: column; gap: var(--space-3); }
.dash-main { display: flex; flex-direction: column; gap: var(--space-3); min-width: 0; }

.status-line { font-family: var(--font-mono); font-size: var(--font-size-xs); color: var(--text-dim); }
.session-info { display: grid; grid-template-columns: auto 1fr; gap: var(--space-1) var(--space-3); }
.session-info dt { color: var(--text-muted); }
.session-info dd { margin: 0; }

.indicator-row { display: flex; justify-content: space-between; align-items: center; }
.indicator-status { display: inline-flex; align-items: center; gap: 6px; padding: 2px 10px; border-radius: var(--radius-pill); font-size: var(--font-size-xs); border: 1px solid var(--border); }
.indicator-status::before { content: ""; width: 8px; height: 8px; border-radius: 50%; background: currentColor; }
.indicator-status.connected { color: var(--positive); border-color: rgba(63, 182, 139, 0.4); }
.indicator-status.connecting { color: var(--warning); border-color: rgba(247, 200, 67, 0.4); }
.indicator-status.disconnected { color: var(--negative); border-color: rgba(240, 99, 92, 0.4); }

.mode-toggle { display: flex; align-items: center; gap: var(--space-2); }
.mode-label { font-weight: 600; }

.chart-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: var(--space-3); }
.chart-cell { position: relative; display: flex; flex-direction: column; gap: var(--space-2); background: var(--bg-elev-1); border: 1px solid var(--border); border-radius: var(--radius); padding: var(--space-2); }
.chart-canvas { width: 100%; height: 220px; display: block; }

.readout-grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: var(--space-1) var(--space-3); font-family: var(--font-mono); }
.readout-grid .readout-key { color: var(--text-muted); }

.ml-grid { display: grid; grid-template-columns: auto 1fr; gap: var(--space-2) var(--space-3); align-items: center; }
.rep-count { font-size: 28px; font-weight: 700; font-family: var(--font-mono); transition: color 300ms ease-out, transform 300ms ease-out; }
.rep-highlight { color: var(--positive); transform: scale(1.15); }
.fatigue { padding: 2px 10px; border-radius: var(--radius-pill); border: 1px solid var(--border); }
.fatigue-low { color: var(--positive); border-color: rgba(63, 182, 139, 0.4); }
.fatigue-medium { color: var(--warning); border-color: rgba(247, 200, 67, 0.4); }
.fatigue-high { color: var(--negative); border-color: rgba(240, 99, 92, 0.4); }
"#;
