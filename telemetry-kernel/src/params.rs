/**
 * PARAMS - Conversion query string -> VesselTelemetry
 *
 * Parsing volontairement permissif : seules l'absence de `veh_id` ou de `type`
 * produisent une erreur. Toute valeur numérique illisible devient une sentinelle
 * (-1 pour l'id, 0 pour le type, 0.0 pour les flottants) et le traitement continue.
 */

use crate::codes::ErrorCode;
use crate::models::{has_target, VesselTelemetry, VesselType};

/// Paramètres dans l'ordre de la requête ; en cas de doublon le premier gagne.
#[derive(Debug, Default, Clone)]
pub struct QueryParams(pub Vec<(String, String)>);

impl QueryParams {
    /// Valeur du paramètre, "" si absent
    pub fn get(&self, key: &str) -> &str {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

/// Entier 64 bits avec détection de base (0x, 0o, 0b, 0 initial = octal).
/// Les `_` sont tolérés entre chiffres ou juste après le préfixe ("1_000").
pub fn parse_vessel_id(raw: &str) -> Option<i64> {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let cleaned;
    let body = if body.contains('_') {
        if !underscores_ok(body) {
            return None;
        }
        cleaned = body.replace('_', "");
        cleaned.as_str()
    } else {
        body
    };

    let (radix, digits) = if let Some(rest) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        (8, rest)
    } else if let Some(rest) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, rest)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return None;
        }
        Some((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).ok()
    }
}

// `_` uniquement entre deux chiffres, ou entre le préfixe de base et un chiffre
fn underscores_ok(body: &str) -> bool {
    let b = body.as_bytes();
    let mut i = 0;
    let mut hex = false;
    // 'd' = chiffre, '_' = underscore, '^' = début, '!' = autre
    let mut saw = b'^';
    if b.len() >= 2 && b[0] == b'0' && matches!(b[1] | 0x20, b'b' | b'o' | b'x') {
        hex = b[1] | 0x20 == b'x';
        i = 2;
        saw = b'd';
    }
    for &c in &b[i..] {
        if c.is_ascii_digit() || (hex && c.is_ascii_hexdigit()) {
            saw = b'd';
        } else if c == b'_' {
            if saw != b'd' {
                return false;
            }
            saw = b'_';
        } else {
            if saw == b'_' {
                return false;
            }
            saw = b'!';
        }
    }
    saw != b'_'
}

/// Premier entier décimal en tête de chaîne ("2abc" -> 2), 0 sinon
pub fn parse_type_code(raw: &str) -> i32 {
    let s = raw.trim_start();
    let sign_len = usize::from(s.starts_with('-') || s.starts_with('+'));
    let digits_len = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return 0;
    }
    s[..sign_len + digits_len].parse().unwrap_or(0)
}

/// Flottant en tête de chaîne ("1.5abc" -> 1.5, "0x1p4" -> 16), 0.0 sinon.
/// Le jeton est découpé en une passe puis parsé une seule fois ; un jeton
/// invalide ("1e", "0x1.8" sans exposant) donne 0.0.
/// NaN/inf ramenés à 0.0 pour garder un JSON valide.
pub fn parse_coord(raw: &str) -> f64 {
    let s = raw.trim_start();
    let (token, hex) = float_token(s);
    let value = if hex {
        parse_hex_float(token)
    } else {
        token.parse::<f64>().ok()
    };
    value.map(finite_or_zero).unwrap_or(0.0)
}

/// Découpe signe, chiffres, `.`, chiffres, exposant. Retourne (jeton, hexa).
fn float_token(s: &str) -> (&str, bool) {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let rest = &b[i..];
    if rest.len() >= 3 {
        let word = [rest[0] | 0x20, rest[1] | 0x20, rest[2] | 0x20];
        if &word == b"nan" || &word == b"inf" {
            // non fini de toute façon
            return ("", false);
        }
    }

    let mut hex = false;
    if rest.len() >= 2 && rest[0] == b'0' && rest[1] | 0x20 == b'x' {
        hex = true;
        i += 2;
    }
    let is_digit = |c: u8| if hex { c.is_ascii_hexdigit() } else { c.is_ascii_digit() };

    while i < b.len() && is_digit(b[i]) {
        i += 1;
    }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        while i < b.len() && is_digit(b[i]) {
            i += 1;
        }
    }
    let exp_marker = if hex { b'p' } else { b'e' };
    if i < b.len() && b[i] | 0x20 == exp_marker {
        i += 1;
        if i < b.len() && matches!(b[i], b'+' | b'-') {
            i += 1;
        }
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
    }
    (&s[..i], hex)
}

/// "0x1.8p3" -> 12.0 ; l'exposant `p` est obligatoire
fn parse_hex_float(token: &str) -> Option<f64> {
    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let body = body.get(2..)?;
    let (mantissa, exp) = body.split_once(|c: char| c == 'p' || c == 'P')?;
    let exp: i64 = exp.parse().ok()?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0.0f64;
    for c in int_part.chars().chain(frac_part.chars()) {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    let shift = exp.saturating_sub(4 * frac_part.len() as i64);
    let shift = shift.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    let value = value * 2f64.powi(shift);
    Some(if negative { -value } else { value })
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Construit l'enregistrement à stocker. Retourne (clé brute, télémétrie).
/// Le timestamp reste à 0, c'est le store qui le pose.
pub fn telemetry_from_query(params: &QueryParams) -> Result<(String, VesselTelemetry), ErrorCode> {
    let veh_id = params.get("veh_id");
    if veh_id.is_empty() {
        return Err(ErrorCode::WrongId);
    }
    let vessel_type = params.get("type");
    if vessel_type.is_empty() {
        return Err(ErrorCode::WrongVesselType);
    }

    let id = parse_vessel_id(veh_id).unwrap_or_else(|| {
        log::warn!("[http] invalid veh_id: {}; set to -1", veh_id);
        -1
    });

    let tgt_x = parse_coord(params.get("tgt_x"));
    let tgt_y = parse_coord(params.get("tgt_y"));

    let telemetry = VesselTelemetry {
        id,
        name: params.get("veh_name").to_string(),
        callsign: params.get("callsign").to_string(),
        x: parse_coord(params.get("veh_x")),
        y: parse_coord(params.get("veh_y")),
        z: parse_coord(params.get("veh_z")),
        abs_speed: parse_coord(params.get("veh_abs_spd")),
        vessel_type: VesselType::from(parse_type_code(vessel_type)),
        direction: parse_coord(params.get("veh_dir")),
        timestamp: 0,
        tgt_x,
        tgt_y,
        tgt_z: parse_coord(params.get("tgt_z")),
        has_target: has_target(tgt_x, tgt_y),
    };

    Ok((veh_id.to_string(), telemetry))
}
