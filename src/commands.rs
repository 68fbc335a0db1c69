//! The command surface: one method per Redis command, each building a
//! [`Cmd`] and handing it to whichever `send_*` helper matches the reply
//! shape the command produces. Mirrors the flat, one-method-per-wire-command
//! style the original command set used, just generalized from one
//! hardware's command set to Redis's.

use crate::connection::Connection;
use crate::framer::Cmd;
use crate::reply::{BoolReply, BulkReply, IntegerReply, MultiBulkReply, TypeReply, VoidReply};

impl Connection {
    // -- strings --------------------------------------------------------

    pub fn get(&self, key: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("GET").arg(key.as_ref()))
    }

    pub fn set(&self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> VoidReply {
        self.send_void(Cmd::new("SET").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn setnx(&self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> BoolReply {
        self.send_bool(Cmd::new("SETNX").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn setex(
        &self,
        key: impl AsRef<str>,
        seconds: i64,
        value: impl AsRef<[u8]>,
    ) -> VoidReply {
        self.send_void(
            Cmd::new("SETEX")
                .arg(key.as_ref())
                .arg(seconds)
                .arg(value.as_ref()),
        )
    }

    pub fn substr(&self, key: impl AsRef<str>, start: i64, end: i64) -> BulkReply {
        self.send_bulk(Cmd::new("SUBSTR").arg(key.as_ref()).arg(start).arg(end))
    }

    pub fn getset(&self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> BulkReply {
        self.send_bulk(Cmd::new("GETSET").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn append(&self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> IntegerReply {
        self.send_integer(Cmd::new("APPEND").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn strlen(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("STRLEN").arg(key.as_ref()))
    }

    pub fn incr(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("INCR").arg(key.as_ref()))
    }

    pub fn incrby(&self, key: impl AsRef<str>, delta: i64) -> IntegerReply {
        self.send_integer(Cmd::new("INCRBY").arg(key.as_ref()).arg(delta))
    }

    pub fn decr(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("DECR").arg(key.as_ref()))
    }

    pub fn decrby(&self, key: impl AsRef<str>, delta: i64) -> IntegerReply {
        self.send_integer(Cmd::new("DECRBY").arg(key.as_ref()).arg(delta))
    }

    pub fn mget<I, S>(&self, keys: I) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = Cmd::new("MGET");
        for key in keys {
            cmd = cmd.arg(key.as_ref());
        }
        self.send_multi(cmd)
    }

    pub fn mset<I, K, V>(&self, pairs: I) -> VoidReply
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut cmd = Cmd::new("MSET");
        for (k, v) in pairs {
            cmd = cmd.arg(k.as_ref()).arg(v.as_ref());
        }
        self.send_void(cmd)
    }

    pub fn msetnx<I, K, V>(&self, pairs: I) -> BoolReply
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut cmd = Cmd::new("MSETNX");
        for (k, v) in pairs {
            cmd = cmd.arg(k.as_ref()).arg(v.as_ref());
        }
        self.send_bool(cmd)
    }

    // -- keys -------------------------------------------------------------

    pub fn del<I, S>(&self, keys: I) -> IntegerReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = Cmd::new("DEL");
        for key in keys {
            cmd = cmd.arg(key.as_ref());
        }
        self.send_integer(cmd)
    }

    pub fn exists(&self, key: impl AsRef<str>) -> BoolReply {
        self.send_bool(Cmd::new("EXISTS").arg(key.as_ref()))
    }

    pub fn expire(&self, key: impl AsRef<str>, seconds: i64) -> BoolReply {
        self.send_bool(Cmd::new("EXPIRE").arg(key.as_ref()).arg(seconds))
    }

    /// `PERSIST` -- stubbed as a TODO in the implementation this client's
    /// design traces back to, but fully implemented here: it maps onto the
    /// same integer-reply shape as every other key-expiry command.
    pub fn persist(&self, key: impl AsRef<str>) -> BoolReply {
        self.send_bool(Cmd::new("PERSIST").arg(key.as_ref()))
    }

    pub fn ttl(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("TTL").arg(key.as_ref()))
    }

    pub fn expireat(&self, key: impl AsRef<str>, unix_time: i64) -> BoolReply {
        self.send_bool(Cmd::new("EXPIREAT").arg(key.as_ref()).arg(unix_time))
    }

    pub fn keys(&self, pattern: impl AsRef<str>) -> MultiBulkReply {
        self.send_multi(Cmd::new("KEYS").arg(pattern.as_ref()))
    }

    pub fn randomkey(&self) -> BulkReply {
        self.send_bulk(Cmd::new("RANDOMKEY"))
    }

    pub fn dbsize(&self) -> IntegerReply {
        self.send_integer(Cmd::new("DBSIZE"))
    }

    pub fn move_key(&self, key: impl AsRef<str>, db: i64) -> BoolReply {
        self.send_bool(Cmd::new("MOVE").arg(key.as_ref()).arg(db))
    }

    pub fn flushdb(&self) -> VoidReply {
        self.send_void(Cmd::new("FLUSHDB"))
    }

    pub fn flushall(&self) -> VoidReply {
        self.send_void(Cmd::new("FLUSHALL"))
    }

    pub fn rename(&self, key: impl AsRef<str>, new_key: impl AsRef<str>) -> VoidReply {
        self.send_void(Cmd::new("RENAME").arg(key.as_ref()).arg(new_key.as_ref()))
    }

    pub fn renamenx(&self, key: impl AsRef<str>, new_key: impl AsRef<str>) -> BoolReply {
        self.send_bool(Cmd::new("RENAMENX").arg(key.as_ref()).arg(new_key.as_ref()))
    }

    /// `TYPE` -- decodes the status reply into a [`crate::config::RedisType`]
    /// rather than leaving the caller to parse the string, falling back to
    /// `RedisType::None` for any value the server returns that this client
    /// doesn't recognize (matching the permissive behavior of the client
    /// this design traces back to, rather than treating an unrecognized
    /// type name as a protocol error).
    pub fn key_type(&self, key: impl AsRef<str>) -> TypeReply {
        self.send_type(Cmd::new("TYPE").arg(key.as_ref()))
    }

    // -- lists --------------------------------------------------------------

    pub fn lpush(&self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> IntegerReply {
        self.send_integer(Cmd::new("LPUSH").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn rpush(&self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> IntegerReply {
        self.send_integer(Cmd::new("RPUSH").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn lpop(&self, key: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("LPOP").arg(key.as_ref()))
    }

    pub fn rpop(&self, key: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("RPOP").arg(key.as_ref()))
    }

    pub fn llen(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("LLEN").arg(key.as_ref()))
    }

    pub fn lrange(&self, key: impl AsRef<str>, start: i64, stop: i64) -> MultiBulkReply {
        self.send_multi(Cmd::new("LRANGE").arg(key.as_ref()).arg(start).arg(stop))
    }

    pub fn lindex(&self, key: impl AsRef<str>, index: i64) -> BulkReply {
        self.send_bulk(Cmd::new("LINDEX").arg(key.as_ref()).arg(index))
    }

    pub fn lset(&self, key: impl AsRef<str>, index: i64, value: impl AsRef<[u8]>) -> VoidReply {
        self.send_void(
            Cmd::new("LSET")
                .arg(key.as_ref())
                .arg(index)
                .arg(value.as_ref()),
        )
    }

    pub fn lrem(&self, key: impl AsRef<str>, count: i64, value: impl AsRef<[u8]>) -> IntegerReply {
        self.send_integer(
            Cmd::new("LREM")
                .arg(key.as_ref())
                .arg(count)
                .arg(value.as_ref()),
        )
    }

    pub fn ltrim(&self, key: impl AsRef<str>, start: i64, stop: i64) -> VoidReply {
        self.send_void(Cmd::new("LTRIM").arg(key.as_ref()).arg(start).arg(stop))
    }

    pub fn rpoplpush(&self, source: impl AsRef<str>, dest: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("RPOPLPUSH").arg(source.as_ref()).arg(dest.as_ref()))
    }

    /// `BLPOP` -- blocks server-side for up to `timeout_seconds`. A timeout
    /// expiry comes back as the RESP null array (`*-1`), which this client
    /// surfaces the same way any other empty [`MultiBulkReply`] would: `None`
    /// from the first [`MultiBulkReply::next_element`] call, not an error.
    pub fn blpop<I, S>(&self, keys: I, timeout_seconds: i64) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = variadic_key_cmd("BLPOP", keys);
        cmd = cmd.arg(timeout_seconds);
        self.send_multi(cmd)
    }

    pub fn brpop<I, S>(&self, keys: I, timeout_seconds: i64) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = variadic_key_cmd("BRPOP", keys);
        cmd = cmd.arg(timeout_seconds);
        self.send_multi(cmd)
    }

    // -- sets -----------------------------------------------------------

    pub fn sadd(&self, key: impl AsRef<str>, member: impl AsRef<[u8]>) -> BoolReply {
        self.send_bool(Cmd::new("SADD").arg(key.as_ref()).arg(member.as_ref()))
    }

    pub fn srem(&self, key: impl AsRef<str>, member: impl AsRef<[u8]>) -> BoolReply {
        self.send_bool(Cmd::new("SREM").arg(key.as_ref()).arg(member.as_ref()))
    }

    pub fn scard(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("SCARD").arg(key.as_ref()))
    }

    pub fn sismember(&self, key: impl AsRef<str>, member: impl AsRef<[u8]>) -> BoolReply {
        self.send_bool(Cmd::new("SISMEMBER").arg(key.as_ref()).arg(member.as_ref()))
    }

    pub fn smembers(&self, key: impl AsRef<str>) -> MultiBulkReply {
        self.send_multi(Cmd::new("SMEMBERS").arg(key.as_ref()))
    }

    pub fn spop(&self, key: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("SPOP").arg(key.as_ref()))
    }

    pub fn srandmember(&self, key: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("SRANDMEMBER").arg(key.as_ref()))
    }

    pub fn smove(
        &self,
        source: impl AsRef<str>,
        dest: impl AsRef<str>,
        member: impl AsRef<[u8]>,
    ) -> BoolReply {
        self.send_bool(
            Cmd::new("SMOVE")
                .arg(source.as_ref())
                .arg(dest.as_ref())
                .arg(member.as_ref()),
        )
    }

    /// `SINTER` -- stubbed as a TODO in the implementation this client's
    /// design traces back to; implemented here over a variadic key list.
    pub fn sinter<I, S>(&self, keys: I) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.send_multi(variadic_key_cmd("SINTER", keys))
    }

    pub fn sinterstore<I, S>(&self, dest: impl AsRef<str>, keys: I) -> IntegerReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = Cmd::new("SINTERSTORE").arg(dest.as_ref());
        for key in keys {
            cmd = cmd.arg(key.as_ref());
        }
        self.send_integer(cmd)
    }

    pub fn sunion<I, S>(&self, keys: I) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.send_multi(variadic_key_cmd("SUNION", keys))
    }

    pub fn sunionstore<I, S>(&self, dest: impl AsRef<str>, keys: I) -> IntegerReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = Cmd::new("SUNIONSTORE").arg(dest.as_ref());
        for key in keys {
            cmd = cmd.arg(key.as_ref());
        }
        self.send_integer(cmd)
    }

    pub fn sdiff<I, S>(&self, keys: I) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.send_multi(variadic_key_cmd("SDIFF", keys))
    }

    pub fn sdiffstore<I, S>(&self, dest: impl AsRef<str>, keys: I) -> IntegerReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = Cmd::new("SDIFFSTORE").arg(dest.as_ref());
        for key in keys {
            cmd = cmd.arg(key.as_ref());
        }
        self.send_integer(cmd)
    }

    // -- hashes ---------------------------------------------------------

    pub fn hset(
        &self,
        key: impl AsRef<str>,
        field: impl AsRef<str>,
        value: impl AsRef<[u8]>,
    ) -> BoolReply {
        self.send_bool(
            Cmd::new("HSET")
                .arg(key.as_ref())
                .arg(field.as_ref())
                .arg(value.as_ref()),
        )
    }

    pub fn hget(&self, key: impl AsRef<str>, field: impl AsRef<str>) -> BulkReply {
        self.send_bulk(Cmd::new("HGET").arg(key.as_ref()).arg(field.as_ref()))
    }

    pub fn hdel(&self, key: impl AsRef<str>, field: impl AsRef<str>) -> BoolReply {
        self.send_bool(Cmd::new("HDEL").arg(key.as_ref()).arg(field.as_ref()))
    }

    pub fn hexists(&self, key: impl AsRef<str>, field: impl AsRef<str>) -> BoolReply {
        self.send_bool(Cmd::new("HEXISTS").arg(key.as_ref()).arg(field.as_ref()))
    }

    pub fn hlen(&self, key: impl AsRef<str>) -> IntegerReply {
        self.send_integer(Cmd::new("HLEN").arg(key.as_ref()))
    }

    pub fn hkeys(&self, key: impl AsRef<str>) -> MultiBulkReply {
        self.send_multi(Cmd::new("HKEYS").arg(key.as_ref()))
    }

    pub fn hvals(&self, key: impl AsRef<str>) -> MultiBulkReply {
        self.send_multi(Cmd::new("HVALS").arg(key.as_ref()))
    }

    pub fn hgetall(&self, key: impl AsRef<str>) -> MultiBulkReply {
        self.send_multi(Cmd::new("HGETALL").arg(key.as_ref()))
    }

    pub fn hincrby(&self, key: impl AsRef<str>, field: impl AsRef<str>, delta: i64) -> IntegerReply {
        self.send_integer(
            Cmd::new("HINCRBY")
                .arg(key.as_ref())
                .arg(field.as_ref())
                .arg(delta),
        )
    }

    /// `HMGET` -- stubbed as a TODO in the implementation this client's
    /// design traces back to; implemented here over a variadic field list.
    pub fn hmget<I, S>(&self, key: impl AsRef<str>, fields: I) -> MultiBulkReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = Cmd::new("HMGET").arg(key.as_ref());
        for field in fields {
            cmd = cmd.arg(field.as_ref());
        }
        self.send_multi(cmd)
    }

    /// `HMSET` -- stubbed as a TODO in the implementation this client's
    /// design traces back to; implemented here over a variadic field/value
    /// list.
    pub fn hmset<I, K, V>(&self, key: impl AsRef<str>, fields: I) -> VoidReply
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut cmd = Cmd::new("HMSET").arg(key.as_ref());
        for (field, value) in fields {
            cmd = cmd.arg(field.as_ref()).arg(value.as_ref());
        }
        self.send_void(cmd)
    }

    // -- admin ------------------------------------------------------------

    pub fn save(&self) -> VoidReply {
        self.send_void(Cmd::new("SAVE"))
    }

    pub fn bgsave(&self) -> VoidReply {
        self.send_void(Cmd::new("BGSAVE"))
    }

    pub fn bgrewriteaof(&self) -> VoidReply {
        self.send_void(Cmd::new("BGREWRITEAOF"))
    }

    pub fn lastsave(&self) -> IntegerReply {
        self.send_integer(Cmd::new("LASTSAVE"))
    }

    pub fn info(&self) -> BulkReply {
        self.send_bulk(Cmd::new("INFO"))
    }
}

fn variadic_key_cmd<I, S>(name: &'static str, keys: I) -> Cmd
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = Cmd::new(name);
    for key in keys {
        cmd = cmd.arg(key.as_ref());
    }
    cmd
}
