// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Carrier Status Mapping
//!
//! Maps the free-text CTT shipment event description (Spanish, Portuguese,
//! occasionally English) onto Shopify's closed set of fulfillment event
//! statuses. Matching is accent- and case-insensitive keyword containment,
//! checked in priority order; a text that matches nothing maps to no event
//! at all rather than guessing.

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Shopify fulfillment event statuses accepted by the Admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    InTransit,
    Confirmed,
    OutForDelivery,
    Delivered,
    Failure,
    ReadyForPickup,
    AttemptedDelivery,
}

impl EventStatus {
    /// Wire name used by the Shopify Admin API.
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::InTransit => "in_transit",
            EventStatus::Confirmed => "confirmed",
            EventStatus::OutForDelivery => "out_for_delivery",
            EventStatus::Delivered => "delivered",
            EventStatus::Failure => "failure",
            EventStatus::ReadyForPickup => "ready_for_pickup",
            EventStatus::AttemptedDelivery => "attempted_delivery",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Keyword tables hold pre-normalized needles: lowercase, accents folded.

const DELIVERED: &[&str] = &[
    "entregado",
    "entregue",
    "entrega efectuada",
    "delivered",
    "entregado ao destinatario",
    "entregado al destinatario",
    "entregado en buzon",
    "buzon",
];

const FAILURE: &[&str] = &[
    "devolucion",
    "devolucao",
    "retorno",
    "retornado",
    "en devolucion",
    "devuelto",
    "devolvido",
    "direccion incorrecta",
    "destinatario desconocido",
    "desconocido",
    "rechazado",
    "recusado",
    "perdido",
    "extraviado",
    "danado",
    "roubado",
    "robado",
    "incidencia grave",
    "no entregable",
];

const ATTEMPTED_DELIVERY: &[&str] = &[
    "intento",
    "tentativa",
    "ausente",
    "nao foi possivel entregar",
    "no se pudo entregar",
    "no ha sido posible entregar",
    "cliente ausente",
    "destinatario ausente",
    "destinatario no disponible",
    "no atendido",
    "no localizado",
    "reparto fallido",
    "fallo en entrega",
    "entrega fallida",
];

const READY_FOR_PICKUP: &[&str] = &[
    "listo para recoger",
    "listo p/ recoger",
    "pronto para levantamento",
    "disponible para recogida",
    "disponivel para recolha",
    "en punto",
    "punto de recogida",
    "ponto de recolha",
    "en tienda",
    "en oficina",
    "en delegacion",
    "locker",
    "parcel shop",
    "pick up",
    "pickup",
];

const OUT_FOR_DELIVERY: &[&str] = &[
    "en reparto",
    "en distribucion",
    "saiu para entrega",
    "saiu p/ entrega",
    "em distribuicao",
    "out for delivery",
    "repartidor",
    "en ruta de entrega",
    "en ruta",
    "entrega hoy",
];

// "Pendiente de recepción en CTT Express" normalizes to
// "pendiente de recepcion ..." and must land here, not in transit.
const CONFIRMED: &[&str] = &[
    "pendiente de recepcion",
    "admitido",
    "admitida",
    "aceptado",
    "aceite",
    "aceite pela ctt",
    "aceite pela rede",
    "registrado",
    "registado",
    "recebido",
    "recebida",
    "entrada en red",
    "entrada em rede",
    "grabado",
];

const IN_TRANSIT: &[&str] = &[
    "en transito",
    "em transito",
    "en curso",
    "en proceso",
    "clasificado",
    "classificado",
    "en plataforma",
    "hub",
    "en centro",
    "en almac",
    "almacen",
    "armazem",
    "salida de",
    "salio de",
    "saida de",
    "departed",
    "llegada a",
    "chegada a",
    "arrived",
    "enviado",
    "cambio direccion y fecha de entrega",
];

/// Texts that describe no shipment movement yet. Matching one of these (or
/// nothing at all) creates no fulfillment event.
const AMBIGUOUS: &[&str] = &[
    "aguardando",
    "a aguardar",
    "preaviso",
    "pre-aviso",
    "informacion recibida",
    "info recibida",
    "etiqueta creada",
    "sin eventos",
];

/// Normalize a carrier text for matching: trim, lowercase, fold accents
/// (NFKD with combining marks stripped), collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Map a raw CTT event description to a Shopify fulfillment event status.
///
/// Returns `None` for empty, ambiguous, or unrecognized texts; the caller
/// creates no event in that case.
pub fn map_carrier_status(text: &str) -> Option<EventStatus> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    if contains_any(&normalized, DELIVERED) {
        return Some(EventStatus::Delivered);
    }
    if contains_any(&normalized, FAILURE) {
        return Some(EventStatus::Failure);
    }
    if contains_any(&normalized, ATTEMPTED_DELIVERY) {
        return Some(EventStatus::AttemptedDelivery);
    }
    if contains_any(&normalized, READY_FOR_PICKUP) {
        return Some(EventStatus::ReadyForPickup);
    }
    if contains_any(&normalized, OUT_FOR_DELIVERY) {
        return Some(EventStatus::OutForDelivery);
    }
    if contains_any(&normalized, CONFIRMED) {
        return Some(EventStatus::Confirmed);
    }
    if contains_any(&normalized, IN_TRANSIT) {
        return Some(EventStatus::InTransit);
    }
    if contains_any(&normalized, AMBIGUOUS) {
        return None;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_accents_and_case() {
        assert_eq!(normalize("  EN TRÁNSITO  "), "en transito");
        assert_eq!(normalize("Entregado al destinatário"), "entregado al destinatario");
        assert_eq!(normalize("em  distribuição"), "em distribuicao");
    }

    #[test]
    fn normalize_collapses_inner_whitespace() {
        assert_eq!(normalize("salida\tde   plataforma"), "salida de plataforma");
    }

    #[test]
    fn delivered_texts_map_to_delivered() {
        for text in [
            "Entregado",
            "ENTREGUE",
            "Entrega efectuada",
            "Entregado en buzón",
            "Entregado al destinatario a las 12:30",
        ] {
            assert_eq!(map_carrier_status(text), Some(EventStatus::Delivered), "{text}");
        }
    }

    #[test]
    fn return_and_incident_texts_map_to_failure() {
        for text in [
            "En devolución al remitente",
            "Destinatario desconocido",
            "Envío dañado",
            "Rechazado por el cliente",
        ] {
            assert_eq!(map_carrier_status(text), Some(EventStatus::Failure), "{text}");
        }
    }

    #[test]
    fn failed_attempt_texts_map_to_attempted_delivery() {
        for text in [
            "Intento de entrega fallido",
            "Cliente ausente",
            "Não foi possível entregar",
        ] {
            assert_eq!(
                map_carrier_status(text),
                Some(EventStatus::AttemptedDelivery),
                "{text}"
            );
        }
    }

    #[test]
    fn pickup_point_texts_map_to_ready_for_pickup() {
        for text in [
            "Disponible para recogida",
            "Pronto para levantamento",
            "Depositado en locker",
        ] {
            assert_eq!(
                map_carrier_status(text),
                Some(EventStatus::ReadyForPickup),
                "{text}"
            );
        }
    }

    #[test]
    fn delivery_round_texts_map_to_out_for_delivery() {
        for text in ["En reparto", "Saiu para entrega", "En ruta de entrega"] {
            assert_eq!(
                map_carrier_status(text),
                Some(EventStatus::OutForDelivery),
                "{text}"
            );
        }
    }

    #[test]
    fn admission_texts_map_to_confirmed() {
        for text in [
            "Pendiente de recepción en CTT Express",
            "Admitido",
            "Entrada en red",
        ] {
            assert_eq!(map_carrier_status(text), Some(EventStatus::Confirmed), "{text}");
        }
    }

    #[test]
    fn movement_texts_map_to_in_transit() {
        for text in [
            "En tránsito",
            "Clasificado en plataforma",
            "Salida de delegación origen",
            "Llegada a centro logístico",
        ] {
            assert_eq!(map_carrier_status(text), Some(EventStatus::InTransit), "{text}");
        }
    }

    #[test]
    fn delivered_wins_over_later_tables() {
        // Contains pickup-ish vocabulary but the delivered table is checked first.
        assert_eq!(
            map_carrier_status("Entregado en punto de recogida"),
            Some(EventStatus::Delivered)
        );
    }

    #[test]
    fn admission_wins_over_in_transit_vocabulary() {
        assert_eq!(
            map_carrier_status("Pendiente de recepción en CTT Express"),
            Some(EventStatus::Confirmed)
        );
    }

    #[test]
    fn ambiguous_and_unknown_texts_map_to_none() {
        for text in ["Aguardando", "Pre-aviso", "Sin eventos", "xyzzy", "", "   "] {
            assert_eq!(map_carrier_status(text), None, "{text:?}");
        }
    }

    #[test]
    fn event_status_wire_names_are_stable() {
        assert_eq!(EventStatus::InTransit.as_str(), "in_transit");
        assert_eq!(EventStatus::ReadyForPickup.as_str(), "ready_for_pickup");
        assert_eq!(
            serde_json::to_string(&EventStatus::AttemptedDelivery).unwrap(),
            "\"attempted_delivery\""
        );
    }
}
