use crate::console::{DeveloperConsole, Tab};
use crate::log_buffer::{LogBuffer, LogKind};
use crate::options::{OptionData, OptionsTab};

use keystone_core::{short_type_name, Service, ServiceRegistry};
use keystone_ui::{split_camel_case, StateService, ViewService};

use std::collections::BTreeMap;

const DEFAULT_LOG_TAIL: usize = 10;

/// Everything a command may touch.
pub struct CommandCtx<'a> {
    pub services: &'a ServiceRegistry,
    pub logs: &'a LogBuffer,
    pub options: &'a mut OptionsTab,
    pub console: &'a mut DeveloperConsole,
}

type CmdFn = fn(&CommandSet, &mut CommandCtx<'_>, &str) -> Result<String, String>;

struct Cmd {
    help: &'static str,
    usage: &'static str,
    f: CmdFn,
}

/// Built-in console commands, keyed by name.
pub struct CommandSet {
    cmds: BTreeMap<&'static str, Cmd>,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSet {
    pub fn new() -> Self {
        let mut cmds = BTreeMap::<&'static str, Cmd>::new();

        cmds.insert(
            "help",
            Cmd {
                help: "List commands",
                usage: "help [command]",
                f: |set, _, line| match args(line).first() {
                    Some(name) => set.usage(name),
                    None => Ok(set.help_text()),
                },
            },
        );

        cmds.insert(
            "services",
            Cmd {
                help: "List registered services",
                usage: "services",
                f: |_, ctx, _| {
                    Ok(ctx
                        .services
                        .names()
                        .into_iter()
                        .map(split_camel_case)
                        .collect::<Vec<_>>()
                        .join("\n"))
                },
            },
        );

        cmds.insert(
            "states",
            Cmd {
                help: "List states, current one marked",
                usage: "states",
                f: |_, ctx, _| {
                    with_service::<StateService, _, _>(ctx.services, |states| {
                        let current = states.current_state_name();
                        Ok(states
                            .state_names()
                            .into_iter()
                            .map(|n| {
                                let mark = if Some(n) == current { "*" } else { " " };
                                format!("{mark} {n}")
                            })
                            .collect::<Vec<_>>()
                            .join("\n"))
                    })
                },
            },
        );

        cmds.insert(
            "state",
            Cmd {
                help: "Change the current state",
                usage: "state <name>",
                f: |set, ctx, line| {
                    let name = one_arg(set, "state", line)?;
                    with_service::<StateService, _, _>(ctx.services, |states| {
                        states.change_state_named(name).map_err(|e| e.to_string())?;
                        Ok(format!(
                            "current state: {}",
                            states.current_state_name().unwrap_or("none")
                        ))
                    })
                },
            },
        );

        cmds.insert(
            "views",
            Cmd {
                help: "List views with their state",
                usage: "views",
                f: |_, ctx, _| {
                    with_service::<ViewService, _, _>(ctx.services, |views| {
                        if views.views().is_empty() {
                            let msg = if views.is_settled() { "no views" } else { "views loading" };
                            return Ok(msg.to_owned());
                        }
                        Ok(views
                            .views()
                            .iter()
                            .map(|v| {
                                let state = v.state().as_str();
                                match v.behaviour().describe() {
                                    Some(d) => format!("{:<24} {state:<8} {d}", v.type_name()),
                                    None => format!("{:<24} {state}", v.type_name()),
                                }
                            })
                            .collect::<Vec<_>>()
                            .join("\n"))
                    })
                },
            },
        );

        cmds.insert(
            "open",
            Cmd {
                help: "Open a view",
                usage: "open <view>",
                f: |set, ctx, line| {
                    let name = one_arg(set, "open", line)?;
                    let started = with_service::<ViewService, _, _>(ctx.services, |views| {
                        views.open_named(name).map_err(|e| e.to_string())
                    })?;
                    Ok(if started {
                        format!("opening {name}")
                    } else {
                        format!("{name} is already open")
                    })
                },
            },
        );

        cmds.insert(
            "close",
            Cmd {
                help: "Close a view",
                usage: "close <view>",
                f: |set, ctx, line| {
                    let name = one_arg(set, "close", line)?;
                    let started = with_service::<ViewService, _, _>(ctx.services, |views| {
                        views.close_named(name).map_err(|e| e.to_string())
                    })?;
                    Ok(if started {
                        format!("closing {name}")
                    } else {
                        format!("{name} is already closed")
                    })
                },
            },
        );

        cmds.insert(
            "logs",
            Cmd {
                help: "Show the last captured log lines",
                usage: "logs [n]",
                f: |_, ctx, line| {
                    let n = match args(line).first() {
                        Some(s) => s.parse::<usize>().map_err(|_| format!("not a count: {s}"))?,
                        None => DEFAULT_LOG_TAIL,
                    };
                    let c = ctx.logs.counts();
                    let mut out = format!(
                        "logs {} | warnings {} | errors {}",
                        c.logs, c.warnings, c.errors
                    );
                    for e in ctx.logs.tail(n) {
                        out.push_str(&format!("\n[{}] {}: {}", e.kind.as_str(), e.target, e.text));
                    }
                    Ok(out)
                },
            },
        );

        cmds.insert(
            "select",
            Cmd {
                help: "Show details of a visible log line",
                usage: "select <index>",
                f: |set, ctx, line| {
                    let raw = one_arg(set, "select", line)?;
                    let index = raw
                        .parse::<usize>()
                        .map_err(|_| format!("not an index: {raw}"))?;
                    ctx.logs
                        .select(index)
                        .ok_or_else(|| format!("no visible log line at {index}"))
                },
            },
        );

        cmds.insert(
            "filter",
            Cmd {
                help: "Show or hide a log kind",
                usage: "filter <log|warning|error> <on|off>",
                f: |set, ctx, line| {
                    let a = args(line);
                    let (Some(kind), Some(flag)) = (a.first(), a.get(1)) else {
                        return set.usage("filter").and_then(Err);
                    };
                    let kind =
                        LogKind::parse(kind).ok_or_else(|| format!("unknown log kind: {kind}"))?;
                    let visible = parse_flag(flag)?;
                    ctx.logs.set_visible(kind, visible);
                    Ok(format!(
                        "{} {}",
                        kind.as_str(),
                        if visible { "shown" } else { "hidden" }
                    ))
                },
            },
        );

        cmds.insert(
            "clear",
            Cmd {
                help: "Clear captured logs",
                usage: "clear",
                f: |_, ctx, _| {
                    ctx.logs.clear();
                    Ok("logs cleared".into())
                },
            },
        );

        cmds.insert(
            "pin",
            Cmd {
                help: "Keep log counts visible while the console is closed",
                usage: "pin [on|off]",
                f: |_, ctx, line| {
                    let pinned = match args(line).first() {
                        Some(flag) => parse_flag(flag)?,
                        None => !ctx.logs.is_pinned(),
                    };
                    ctx.logs.set_pinned(pinned);
                    Ok(format!("log counts {}", if pinned { "pinned" } else { "unpinned" }))
                },
            },
        );

        cmds.insert(
            "console",
            Cmd {
                help: "Open, close or switch tabs of the console overlay",
                usage: "console <open|close|console|options>",
                f: |set, ctx, line| {
                    let arg = one_arg(set, "console", line)?;
                    match arg {
                        "open" => {
                            ctx.console.open();
                        }
                        "close" => {
                            ctx.console.close();
                        }
                        other => {
                            let tab = Tab::parse(other)
                                .ok_or_else(|| format!("unknown tab: {other}"))?;
                            ctx.console.open();
                            ctx.console.select_tab(tab);
                        }
                    }
                    Ok(match ctx.console.selected_tab() {
                        Some(t) => format!("console open on {}", t.name()),
                        None => "console closed".into(),
                    })
                },
            },
        );

        cmds.insert(
            "options",
            Cmd {
                help: "List options by category",
                usage: "options",
                f: |_, ctx, _| Ok(ctx.options.render().trim_end().to_owned()),
            },
        );

        cmds.insert(
            "opt",
            Cmd {
                help: "Use an option: flip a toggle, run an action, submit an input",
                usage: "opt <label> [value]",
                f: |set, ctx, line| set_option(set, ctx, line),
            },
        );

        cmds.insert(
            "history",
            Cmd {
                help: "List previous commands",
                usage: "history",
                f: |_, ctx, _| Ok(ctx.console.history().collect::<Vec<_>>().join("\n")),
            },
        );

        cmds.insert(
            "quit",
            Cmd {
                help: "Exit engine",
                usage: "quit",
                f: |_, ctx, _| {
                    ctx.services.request_exit();
                    Ok("exit requested".into())
                },
            },
        );

        Self { cmds }
    }

    pub fn exec(&self, ctx: &mut CommandCtx<'_>, line: &str) -> Result<String, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(String::new());
        }

        let head = line.split_whitespace().next().unwrap_or("");
        let Some(cmd) = self.cmds.get(head) else {
            return Err(format!("unknown command: {head}"));
        };
        (cmd.f)(self, ctx, line)
    }

    /// Command names starting with `input`.
    pub fn complete(&self, input: &str) -> Vec<String> {
        let prefix = input.trim_start();
        self.cmds
            .keys()
            .filter(|k| k.starts_with(prefix))
            .map(|k| (*k).to_owned())
            .collect()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.cmds.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.cmds.keys().copied().collect()
    }

    pub fn help_text(&self) -> String {
        let mut out = String::new();
        for (name, c) in &self.cmds {
            out.push_str("  ");
            out.push_str(name);
            out.push_str("  - ");
            out.push_str(c.help);
            out.push('\n');
        }
        out.trim_end().to_owned()
    }

    fn usage(&self, name: &str) -> Result<String, String> {
        match self.cmds.get(name) {
            Some(c) => Ok(format!("usage: {}", c.usage)),
            None => Err(format!("unknown command: {name}")),
        }
    }
}

fn args(line: &str) -> Vec<&str> {
    line.split_whitespace().skip(1).collect()
}

fn one_arg<'l>(set: &CommandSet, name: &str, line: &'l str) -> Result<&'l str, String> {
    match line.split_whitespace().nth(1) {
        Some(a) => Ok(a),
        None => set.usage(name).and_then(Err),
    }
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(format!("expected on/off, got: {s}")),
    }
}

/// Runs `f` on a mutably borrowed service.
fn with_service<T, R, F>(services: &ServiceRegistry, f: F) -> Result<R, String>
where
    T: Service,
    F: FnOnce(&mut T) -> Result<R, String>,
{
    let name = short_type_name::<T>();
    let handle = services
        .try_get::<T>()
        .ok_or_else(|| format!("{name} is not registered"))?;
    let mut guard = handle
        .try_borrow_mut()
        .map_err(|_| format!("{name} is busy"))?;
    f(&mut guard)
}

fn set_option(set: &CommandSet, ctx: &mut CommandCtx<'_>, line: &str) -> Result<String, String> {
    let a = args(line);
    if a.is_empty() {
        return set.usage("opt").and_then(Err);
    }

    // Labels may contain spaces: try the longest prefix that names an option.
    let (id, value) = (1..=a.len())
        .rev()
        .find_map(|n| {
            let id = ctx.options.find(&a[..n].join(" "))?;
            Some((id, (n < a.len()).then(|| a[n..].join(" "))))
        })
        .ok_or_else(|| format!("no option labelled '{}'", a.join(" ")))?;

    let kind = ctx.options.get(id).map(OptionData::kind).unwrap_or("text");
    match (kind, value) {
        ("toggle", v) => {
            let current = matches!(
                ctx.options.get(id),
                Some(OptionData::Toggle { value: true, .. })
            );
            let next = match v {
                Some(v) => parse_flag(&v)?,
                None => !current,
            };
            ctx.options.set_toggle(id, next).map_err(|e| e.to_string())?;
        }
        ("action", _) => ctx.options.trigger_action(id).map_err(|e| e.to_string())?,
        ("input", v) => {
            ctx.options
                .set_input(id, v.as_deref().unwrap_or(""))
                .map_err(|e| e.to_string())?;
            ctx.options.submit_input(id).map_err(|e| e.to_string())?;
        }
        ("text", Some(_)) => return Err("text options are read-only".into()),
        _ => {}
    }

    Ok(ctx
        .options
        .get(id)
        .map(ToString::to_string)
        .unwrap_or_default())
}
