//! Catalog of remote command names.
//!
//! Client libraries expose remote commands and local management methods
//! side by side. This crate answers one question: does a property name
//! denote a remote command?
//!
//! ```rust
//! use deferkv_commands::is_command;
//!
//! assert!(is_command("get"));
//! assert!(is_command("HSET"));
//! assert!(!is_command("on"));
//! assert!(!is_command("duplicate"));
//! ```

use std::collections::HashSet;

use lazy_static::lazy_static;

const COMMANDS: &[&str] = &[
    // connection
    "auth",
    "client",
    "echo",
    "hello",
    "ping",
    "quit",
    "reset",
    "select",
    // server
    "bgrewriteaof",
    "bgsave",
    "command",
    "config",
    "dbsize",
    "debug",
    "flushall",
    "flushdb",
    "info",
    "lastsave",
    "memory",
    "monitor",
    "save",
    "shutdown",
    "slowlog",
    "time",
    // keys
    "copy",
    "del",
    "dump",
    "exists",
    "expire",
    "expireat",
    "keys",
    "move",
    "object",
    "persist",
    "pexpire",
    "pexpireat",
    "pttl",
    "randomkey",
    "rename",
    "renamenx",
    "restore",
    "scan",
    "sort",
    "touch",
    "ttl",
    "type",
    "unlink",
    "wait",
    // strings
    "append",
    "decr",
    "decrby",
    "get",
    "getdel",
    "getex",
    "getrange",
    "getset",
    "incr",
    "incrby",
    "incrbyfloat",
    "mget",
    "mset",
    "msetnx",
    "psetex",
    "set",
    "setex",
    "setnx",
    "setrange",
    "strlen",
    // bits
    "bitcount",
    "bitfield",
    "bitop",
    "bitpos",
    "getbit",
    "setbit",
    // hashes
    "hdel",
    "hexists",
    "hget",
    "hgetall",
    "hincrby",
    "hincrbyfloat",
    "hkeys",
    "hlen",
    "hmget",
    "hmset",
    "hscan",
    "hset",
    "hsetnx",
    "hstrlen",
    "hvals",
    // lists
    "blmove",
    "blpop",
    "brpop",
    "brpoplpush",
    "lindex",
    "linsert",
    "llen",
    "lmove",
    "lpop",
    "lpos",
    "lpush",
    "lpushx",
    "lrange",
    "lrem",
    "lset",
    "ltrim",
    "rpop",
    "rpoplpush",
    "rpush",
    "rpushx",
    // sets
    "sadd",
    "scard",
    "sdiff",
    "sdiffstore",
    "sinter",
    "sinterstore",
    "sismember",
    "smembers",
    "smismember",
    "smove",
    "spop",
    "srandmember",
    "srem",
    "sscan",
    "sunion",
    "sunionstore",
    // sorted sets
    "bzpopmax",
    "bzpopmin",
    "zadd",
    "zcard",
    "zcount",
    "zincrby",
    "zinterstore",
    "zlexcount",
    "zpopmax",
    "zpopmin",
    "zrange",
    "zrangebylex",
    "zrangebyscore",
    "zrank",
    "zrem",
    "zremrangebylex",
    "zremrangebyrank",
    "zremrangebyscore",
    "zrevrange",
    "zrevrangebyscore",
    "zrevrank",
    "zscan",
    "zscore",
    "zunionstore",
    // hyperloglog
    "pfadd",
    "pfcount",
    "pfmerge",
    // geo
    "geoadd",
    "geodist",
    "geohash",
    "geopos",
    "georadius",
    "georadiusbymember",
    // streams
    "xack",
    "xadd",
    "xclaim",
    "xdel",
    "xgroup",
    "xinfo",
    "xlen",
    "xpending",
    "xrange",
    "xread",
    "xreadgroup",
    "xrevrange",
    "xtrim",
    // pub/sub
    "psubscribe",
    "publish",
    "pubsub",
    "punsubscribe",
    "subscribe",
    "unsubscribe",
    // scripting
    "eval",
    "evalsha",
    "script",
    // transactions
    "discard",
    "exec",
    "multi",
    "unwatch",
    "watch",
];

lazy_static! {
    static ref CATALOG: HashSet<&'static str> = COMMANDS.iter().copied().collect();
}

/// Whether `name` denotes a remote command. ASCII case-insensitive.
pub fn is_command(name: &str) -> bool {
    if CATALOG.contains(name) {
        return true;
    }
    name.bytes().any(|b| b.is_ascii_uppercase()) && CATALOG.contains(name.to_ascii_lowercase().as_str())
}

/// All known command names, lower-case.
pub fn commands() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().copied()
}
