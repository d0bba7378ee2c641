//! Response and fault envelopes.

use super::{SERVICE_NS, SOAP_ENV_NS, XSD_NS, XSI_NS};
use crate::config::{EntityDef, Record};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

/// What an operation produced.
pub enum SoapResult<'a> {
    Many(&'a [Record]),
    One(Option<&'a Record>),
}

type XmlWriter = Writer<Vec<u8>>;

fn open_envelope(w: &mut XmlWriter) -> quick_xml::Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    w.write_event(Event::Start(BytesStart::new("soap:Envelope").with_attributes([
        ("xmlns:soap", SOAP_ENV_NS),
        ("xmlns:xsi", XSI_NS),
        ("xmlns:xsd", XSD_NS),
    ])))?;
    w.write_event(Event::Start(BytesStart::new("soap:Body")))
}

fn close_envelope(w: &mut XmlWriter) -> quick_xml::Result<()> {
    w.write_event(Event::End(BytesEnd::new("soap:Body")))?;
    w.write_event(Event::End(BytesEnd::new("soap:Envelope")))
}

fn nil(w: &mut XmlWriter, name: &str) -> quick_xml::Result<()> {
    w.write_event(Event::Empty(BytesStart::new(name).with_attributes([("xsi:nil", "true")])))
}

fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> quick_xml::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

/// One child element per column, in column order.
fn columns(w: &mut XmlWriter, entity: &EntityDef, record: &Record) -> quick_xml::Result<()> {
    for c in &entity.columns {
        match record.get(c.name) {
            None => continue,
            Some(Value::Null) => nil(w, c.name)?,
            Some(Value::String(s)) => text_element(w, c.name, s)?,
            Some(other) => text_element(w, c.name, &other.to_string())?,
        }
    }
    Ok(())
}

fn finish(w: XmlWriter) -> String {
    String::from_utf8_lossy(&w.into_inner()).into_owned()
}

fn write_response(entity: &EntityDef, operation: &str, result: SoapResult<'_>) -> quick_xml::Result<String> {
    let response = format!("{}Response", operation);
    let result_name = format!("{}Result", operation);
    let mut w = Writer::new(Vec::new());
    open_envelope(&mut w)?;
    w.write_event(Event::Start(BytesStart::new(response.as_str()).with_attributes([("xmlns", SERVICE_NS)])))?;
    match result {
        SoapResult::Many(records) => {
            w.write_event(Event::Start(BytesStart::new(result_name.as_str())))?;
            for r in records {
                w.write_event(Event::Start(BytesStart::new(entity.label)))?;
                columns(&mut w, entity, r)?;
                w.write_event(Event::End(BytesEnd::new(entity.label)))?;
            }
            w.write_event(Event::End(BytesEnd::new(result_name.as_str())))?;
        }
        SoapResult::One(Some(r)) => {
            w.write_event(Event::Start(BytesStart::new(result_name.as_str())))?;
            columns(&mut w, entity, r)?;
            w.write_event(Event::End(BytesEnd::new(result_name.as_str())))?;
        }
        SoapResult::One(None) => nil(&mut w, &result_name)?,
    }
    w.write_event(Event::End(BytesEnd::new(response.as_str())))?;
    close_envelope(&mut w)?;
    Ok(finish(w))
}

/// `<{op}Response xmlns="http://tempuri.org/"><{op}Result>…</{op}Result></{op}Response>` in an envelope.
/// Lists hold one `<{Label}>` element per record; single results hold the columns directly.
pub fn response_envelope(entity: &EntityDef, operation: &str, result: SoapResult<'_>) -> String {
    write_response(entity, operation, result).unwrap_or_else(|e| fault_envelope("Server", &e.to_string()))
}

/// `soap:Fault` whose `faultcode` is the bare code given (`Client` or `Server`).
pub fn fault_envelope(code: &str, message: &str) -> String {
    let write = || -> quick_xml::Result<String> {
        let mut w = Writer::new(Vec::new());
        open_envelope(&mut w)?;
        w.write_event(Event::Start(BytesStart::new("soap:Fault")))?;
        text_element(&mut w, "faultcode", code)?;
        text_element(&mut w, "faultstring", message)?;
        w.write_event(Event::End(BytesEnd::new("soap:Fault")))?;
        close_envelope(&mut w)?;
        Ok(finish(w))
    };
    // Writing into a Vec cannot fail; the literal keeps the signature infallible.
    write().unwrap_or_else(|_| {
        format!(
            "<soap:Envelope xmlns:soap=\"{}\"><soap:Body><soap:Fault><faultcode>Server</faultcode>\
             <faultstring>Internal Server Error</faultstring></soap:Fault></soap:Body></soap:Envelope>",
            SOAP_ENV_NS
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use serde_json::json;

    fn dept(id: i64, name: &str) -> Record {
        json!({ "dept_id": id, "dept_name": name, "dept_description": null, "hod_id": null })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn list_response_wraps_each_record() {
        let catalog = Catalog::standard().unwrap();
        let department = catalog.entity_by_path("department").unwrap();
        let rows = vec![dept(1, "Physics"), dept(2, "R&D")];
        let xml = response_envelope(department, "ListAsync", SoapResult::Many(&rows));
        assert!(xml.contains("<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\""));
        assert!(xml.contains("<ListAsyncResponse xmlns=\"http://tempuri.org/\"><ListAsyncResult><Department><dept_id>1</dept_id>"));
        assert!(xml.contains("<dept_name>R&amp;D</dept_name>"));
        assert!(xml.contains("<hod_id xsi:nil=\"true\"/>"));
    }

    #[test]
    fn absent_single_result_is_nil() {
        let catalog = Catalog::standard().unwrap();
        let department = catalog.entity_by_path("department").unwrap();
        let xml = response_envelope(department, "GetAsync", SoapResult::One(None));
        assert!(xml.contains("<GetAsyncResult xsi:nil=\"true\"/>"));
    }

    #[test]
    fn fault_carries_code_and_message() {
        let xml = fault_envelope("Client", "first_name is required");
        assert!(xml.contains("<soap:Fault><faultcode>Client</faultcode><faultstring>first_name is required</faultstring></soap:Fault>"));
    }
}
