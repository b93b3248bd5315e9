//! A single database's keys and the data commands that operate on them.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use deferkv_callback::{CommandError, Value};
use regex::Regex;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
const NOT_INTEGER: &str = "ERR value is not an integer or out of range";
const OVERFLOW: &str = "ERR increment or decrement would overflow";
const SYNTAX: &str = "ERR syntax error";

/// A stored value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Str(String),
    Hash(BTreeMap<String, String>),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
}

pub(crate) fn arity_error(command: &str) -> CommandError {
    CommandError::new(
        command,
        format!("ERR wrong number of arguments for '{}' command", command),
    )
}

fn error(command: &str, message: &str) -> CommandError {
    CommandError::new(command, message)
}

fn parse_integer(command: &str, text: &str) -> Result<i64, CommandError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| error(command, NOT_INTEGER))
}

fn count(n: usize) -> Value {
    Value::Integer(n as i64)
}

/// Resolve a possibly-negative inclusive range against a length.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Compile a `KEYS` glob: `*`, `?`, `[...]` classes (with `^` negation and
/// ranges) and `\` escapes. Returns `None` for a pattern with an unclosed or
/// empty class.
pub(crate) fn glob_regex(pattern: &str) -> Option<Regex> {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                out.push_str(&regex::escape(&escaped.to_string()));
            }
            '[' => {
                out.push('[');
                let mut body = 0;
                loop {
                    match chars.next()? {
                        ']' if body > 0 => break,
                        '^' if body == 0 => out.push('^'),
                        '-' if body > 0 => {
                            out.push('-');
                            body += 1;
                        }
                        '\\' => {
                            out.push_str(&regex::escape(&chars.next()?.to_string()));
                            body += 1;
                        }
                        other => {
                            out.push_str(&regex::escape(&other.to_string()));
                            body += 1;
                        }
                    }
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).ok()
}

/// The keys of one database.
#[derive(Debug, Default)]
pub(crate) struct Keyspace {
    entries: HashMap<String, Entry>,
}

impl Keyspace {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn string(&self, command: &str, key: &str) -> Result<Option<&String>, CommandError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Str(s)) => Ok(Some(s)),
            Some(_) => Err(error(command, WRONGTYPE)),
        }
    }

    fn hash(&self, command: &str, key: &str) -> Result<Option<&BTreeMap<String, String>>, CommandError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(error(command, WRONGTYPE)),
        }
    }

    fn list(&self, command: &str, key: &str) -> Result<Option<&VecDeque<String>>, CommandError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::List(l)) => Ok(Some(l)),
            Some(_) => Err(error(command, WRONGTYPE)),
        }
    }

    fn set(&self, command: &str, key: &str) -> Result<Option<&BTreeSet<String>>, CommandError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Set(s)) => Ok(Some(s)),
            Some(_) => Err(error(command, WRONGTYPE)),
        }
    }

    fn hash_mut(&mut self, command: &str, key: &str) -> Result<&mut BTreeMap<String, String>, CommandError> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()))
        {
            Entry::Hash(h) => Ok(h),
            _ => Err(error(command, WRONGTYPE)),
        }
    }

    fn list_mut(&mut self, command: &str, key: &str) -> Result<&mut VecDeque<String>, CommandError> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()))
        {
            Entry::List(l) => Ok(l),
            _ => Err(error(command, WRONGTYPE)),
        }
    }

    fn set_mut(&mut self, command: &str, key: &str) -> Result<&mut BTreeSet<String>, CommandError> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()))
        {
            Entry::Set(s) => Ok(s),
            _ => Err(error(command, WRONGTYPE)),
        }
    }

    fn increment(&mut self, command: &str, key: &str, by: i64) -> Result<Value, CommandError> {
        let current = match self.string(command, key)? {
            Some(s) => parse_integer(command, s)?,
            None => 0,
        };
        let next = current
            .checked_add(by)
            .ok_or_else(|| error(command, OVERFLOW))?;
        self.entries
            .insert(key.to_string(), Entry::Str(next.to_string()));
        Ok(Value::Integer(next))
    }

    /// Run a data command. Arity has already been checked by the caller.
    pub(crate) fn execute(&mut self, command: &str, args: &[String]) -> Result<Value, CommandError> {
        match command {
            "get" => Ok(Value::from(self.string(command, &args[0])?.cloned())),
            "set" => {
                let (mut nx, mut xx) = (false, false);
                for flag in &args[2..] {
                    match flag.to_ascii_uppercase().as_str() {
                        "NX" => nx = true,
                        "XX" => xx = true,
                        _ => return Err(error(command, SYNTAX)),
                    }
                }
                if nx && xx {
                    return Err(error(command, SYNTAX));
                }
                let exists = self.entries.contains_key(&args[0]);
                if (nx && exists) || (xx && !exists) {
                    return Ok(Value::Null);
                }
                self.entries
                    .insert(args[0].clone(), Entry::Str(args[1].clone()));
                Ok(Value::ok())
            }
            "del" => Ok(count(
                args.iter()
                    .filter(|key| self.entries.remove(key.as_str()).is_some())
                    .count(),
            )),
            "exists" => Ok(count(
                args.iter()
                    .filter(|key| self.entries.contains_key(key.as_str()))
                    .count(),
            )),
            "incr" => self.increment(command, &args[0], 1),
            "decr" => self.increment(command, &args[0], -1),
            "incrby" => {
                let by = parse_integer(command, &args[1])?;
                self.increment(command, &args[0], by)
            }
            "append" => {
                let mut text = self.string(command, &args[0])?.cloned().unwrap_or_default();
                text.push_str(&args[1]);
                let len = text.len();
                self.entries.insert(args[0].clone(), Entry::Str(text));
                Ok(count(len))
            }
            "strlen" => Ok(count(self.string(command, &args[0])?.map_or(0, |s| s.len()))),
            "mget" => Ok(Value::Array(
                args.iter()
                    .map(|key| match self.entries.get(key) {
                        Some(Entry::Str(s)) => Value::from(s.as_str()),
                        _ => Value::Null,
                    })
                    .collect(),
            )),
            "mset" => {
                if args.len() % 2 != 0 {
                    return Err(arity_error(command));
                }
                for pair in args.chunks(2) {
                    self.entries
                        .insert(pair[0].clone(), Entry::Str(pair[1].clone()));
                }
                Ok(Value::ok())
            }
            "keys" => {
                let matcher = glob_regex(&args[0]);
                let mut keys: Vec<&String> = self
                    .entries
                    .keys()
                    .filter(|key| matcher.as_ref().is_some_and(|re| re.is_match(key)))
                    .collect();
                keys.sort();
                Ok(Value::Array(
                    keys.into_iter().map(|k| Value::from(k.as_str())).collect(),
                ))
            }
            "dbsize" => Ok(count(self.entries.len())),
            "flushdb" => {
                self.entries.clear();
                Ok(Value::ok())
            }
            "hset" => {
                if (args.len() - 1) % 2 != 0 {
                    return Err(arity_error(command));
                }
                let hash = self.hash_mut(command, &args[0])?;
                let added = args[1..]
                    .chunks(2)
                    .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
                    .count();
                Ok(count(added))
            }
            "hget" => Ok(Value::from(
                self.hash(command, &args[0])?
                    .and_then(|h| h.get(&args[1]))
                    .cloned(),
            )),
            "hgetall" => Ok(Value::Map(
                self.hash(command, &args[0])?
                    .map(|h| {
                        h.iter()
                            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                            .collect()
                    })
                    .unwrap_or_default(),
            )),
            "hdel" => {
                if self.hash(command, &args[0])?.is_none() {
                    return Ok(count(0));
                }
                let hash = self.hash_mut(command, &args[0])?;
                let removed = args[1..]
                    .iter()
                    .filter(|field| hash.remove(field.as_str()).is_some())
                    .count();
                if hash.is_empty() {
                    self.entries.remove(&args[0]);
                }
                Ok(count(removed))
            }
            "lpush" | "rpush" => {
                let list = self.list_mut(command, &args[0])?;
                for item in &args[1..] {
                    if command == "lpush" {
                        list.push_front(item.clone());
                    } else {
                        list.push_back(item.clone());
                    }
                }
                Ok(count(list.len()))
            }
            "lrange" => {
                let start = parse_integer(command, &args[1])?;
                let stop = parse_integer(command, &args[2])?;
                let items = match self.list(command, &args[0])? {
                    Some(list) => match resolve_range(list.len(), start, stop) {
                        Some((from, to)) => list
                            .range(from..=to)
                            .map(|s| Value::from(s.as_str()))
                            .collect(),
                        None => Vec::new(),
                    },
                    None => Vec::new(),
                };
                Ok(Value::Array(items))
            }
            "llen" => Ok(count(self.list(command, &args[0])?.map_or(0, |l| l.len()))),
            "lpop" => {
                if self.list(command, &args[0])?.is_none() {
                    return Ok(Value::Null);
                }
                let list = self.list_mut(command, &args[0])?;
                let popped = list.pop_front();
                if list.is_empty() {
                    self.entries.remove(&args[0]);
                }
                Ok(Value::from(popped))
            }
            "sadd" => {
                let set = self.set_mut(command, &args[0])?;
                Ok(count(
                    args[1..].iter().filter(|m| set.insert((*m).clone())).count(),
                ))
            }
            "smembers" => Ok(Value::Array(
                self.set(command, &args[0])?
                    .map(|s| s.iter().map(|m| Value::from(m.as_str())).collect())
                    .unwrap_or_default(),
            )),
            "sismember" => Ok(Value::Integer(
                self.set(command, &args[0])?
                    .is_some_and(|s| s.contains(&args[1])) as i64,
            )),
            other => Err(error(
                other,
                &format!("ERR unknown command '{}'", other),
            )),
        }
    }
}
